//! Background tracking of environment provisioning progress

pub mod controller;
pub mod session;
pub mod source;
