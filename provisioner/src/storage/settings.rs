//! Settings file management

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;
use crate::models::config::DevCenterConfig;
use crate::utils::parse_bool;

/// Disables the background progress watch loops when truthy
pub const PROGRESS_DISABLE_ENV: &str = "DEVPROV_DEBUG_PROVISION_PROGRESS_DISABLE";

/// Bearer token for the Dev Center and resource manager endpoints
pub const ACCESS_TOKEN_ENV: &str = "DEVPROV_ACCESS_TOKEN";

/// Provisioner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Write logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Also write logs to a rolling file under the state directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Dev Center selection shared by all environments
    #[serde(default)]
    pub dev_center: DevCenterConfig,

    /// Infrastructure template directory, relative to the project
    #[serde(default = "default_infra_path")]
    pub infra_path: String,

    /// Progress reporting configuration
    #[serde(default)]
    pub progress: ProgressSettings,

    /// Interval between long-running operation status checks in seconds
    #[serde(default = "default_lro_poll_interval")]
    pub lro_poll_interval_secs: u64,

    /// Abort the operation after this many seconds
    #[serde(default)]
    pub operation_timeout_secs: Option<u64>,
}

fn default_infra_path() -> String {
    "infra".to_string()
}

fn default_lro_poll_interval() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            json_logs: false,
            log_to_file: false,
            backend: BackendSettings::default(),
            dev_center: DevCenterConfig::default(),
            infra_path: default_infra_path(),
            progress: ProgressSettings::default(),
            lro_poll_interval_secs: default_lro_poll_interval(),
            operation_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Same as [`Settings::apply_env_overrides`] with an explicit lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ACCESS_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.backend.access_token = Some(token);
        }

        if lookup(PROGRESS_DISABLE_ENV)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false)
        {
            self.progress.disabled = true;
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Dev Center data-plane endpoint
    #[serde(default)]
    pub endpoint: String,

    /// Resource manager endpoint
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,

    /// Access token; prefer the environment variable over storing it here
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

fn default_management_endpoint() -> String {
    "https://management.azure.com".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            management_endpoint: default_management_endpoint(),
            access_token: None,
        }
    }
}

/// Progress reporting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSettings {
    /// Turn off the background progress watch loops
    #[serde(default)]
    pub disabled: bool,

    /// First environment poll delay in seconds
    #[serde(default = "default_initial_delay")]
    pub environment_initial_delay_secs: u64,

    /// Environment poll delay in seconds
    #[serde(default = "default_environment_delay")]
    pub environment_regular_delay_secs: u64,

    /// First progress report delay in seconds
    #[serde(default = "default_initial_delay")]
    pub progress_initial_delay_secs: u64,

    /// Progress report delay in seconds
    #[serde(default = "default_progress_delay")]
    pub progress_regular_delay_secs: u64,
}

fn default_initial_delay() -> u64 {
    3
}

fn default_environment_delay() -> u64 {
    5
}

fn default_progress_delay() -> u64 {
    10
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            environment_initial_delay_secs: default_initial_delay(),
            environment_regular_delay_secs: default_environment_delay(),
            progress_initial_delay_secs: default_initial_delay(),
            progress_regular_delay_secs: default_progress_delay(),
        }
    }
}
