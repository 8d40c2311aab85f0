//! Utility functions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version information for the provisioner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Parse a boolean switch the way command line tools usually accept them.
///
/// Accepts `1`, `t`, `true` and `0`, `f`, `false` in any case. Anything else
/// is `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Parse the subset of ISO 8601 durations returned by resource manager
/// (`PT1H2M3.5S`)
pub fn parse_iso8601_duration(value: &str) -> Option<Duration> {
    let rest = value.strip_prefix("PT")?;
    let mut total = 0f64;
    let mut number = String::new();

    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' | 'M' | 'S' => {
                let n: f64 = number.parse().ok()?;
                number.clear();
                total += match c {
                    'H' => n * 3600.0,
                    'M' => n * 60.0,
                    _ => n,
                };
            }
            _ => return None,
        }
    }

    if !number.is_empty() {
        return None;
    }

    Duration::try_from_secs_f64(total).ok()
}

/// Render a duration for humans (`1m 5s`, `42s`)
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, s) => format!("{}h {}m {}s", h, m, s),
    }
}
