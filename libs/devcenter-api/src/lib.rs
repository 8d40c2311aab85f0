//! Dev Center API models
//!
//! Serde representations of the Dev Center data-plane and resource manager
//! payloads consumed by the provisioner.

pub mod models;
