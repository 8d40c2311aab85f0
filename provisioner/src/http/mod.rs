//! Remote API access

pub mod api;
pub mod client;
pub mod definitions;
pub mod deployments;
pub mod environments;
