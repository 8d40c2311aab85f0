//! devprov library
//!
//! Provisions Dev Center environments and watches their deployments.

pub mod app;
pub mod console;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod provision;
pub mod storage;
pub mod utils;
pub mod watch;
pub mod workers;
