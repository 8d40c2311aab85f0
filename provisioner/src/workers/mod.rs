//! Background watch loops

pub mod environment;
pub mod progress;
