//! Domain models

pub mod config;
pub mod provision;
