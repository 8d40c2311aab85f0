//! Local storage

pub mod environment;
pub mod layout;
pub mod settings;
