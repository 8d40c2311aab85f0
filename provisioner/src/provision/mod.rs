//! Dev Center provisioning

pub mod lro;
pub mod outputs;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod source;
