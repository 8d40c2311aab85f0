//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::models::config::DevCenterConfig;
use crate::provision::provider::ProviderOptions;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::watch::controller::ProgressOptions;
use crate::workers::{environment, progress};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Project directory holding the infra templates and state directory
    pub project_dir: PathBuf,

    /// Local environment to operate on
    pub env_name: String,

    /// Dev Center data-plane endpoint
    pub endpoint: String,

    /// Resource manager endpoint
    pub management_endpoint: String,

    /// Bearer token for both endpoints
    pub access_token: Option<String>,

    /// Dev Center defaults shared by all environments
    pub dev_center: DevCenterConfig,

    /// Provider options
    pub provider: ProviderOptions,

    /// Cancel the operation after this long
    pub operation_timeout: Option<Duration>,
}

impl AppOptions {
    /// Build options from the settings file
    pub fn from_settings(settings: &Settings, project_dir: PathBuf, env_name: String) -> Self {
        let progress = ProgressOptions {
            environment: environment::Options {
                initial_delay: Duration::from_secs(settings.progress.environment_initial_delay_secs),
                regular_delay: Duration::from_secs(settings.progress.environment_regular_delay_secs),
                ..Default::default()
            },
            progress: progress::Options {
                initial_delay: Duration::from_secs(settings.progress.progress_initial_delay_secs),
                regular_delay: Duration::from_secs(settings.progress.progress_regular_delay_secs),
                ..Default::default()
            },
        }
        .with_disabled(settings.progress.disabled);

        Self {
            project_dir,
            env_name,
            endpoint: settings.backend.endpoint.clone(),
            management_endpoint: settings.backend.management_endpoint.clone(),
            access_token: settings.backend.access_token.clone(),
            dev_center: settings.dev_center.clone(),
            provider: ProviderOptions {
                infra_path: PathBuf::from(&settings.infra_path),
                lro_poll_interval: Duration::from_secs(settings.lro_poll_interval_secs),
                progress,
            },
            operation_timeout: settings.operation_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Storage layout of the project
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::for_project(&self.project_dir)
    }
}
