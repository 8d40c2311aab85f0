//! Environment API client

use devcenter_api::models::{EnvironmentResource, EnvironmentSpec, OperationStatus};
use url::Url;

use crate::errors::ProvisionError;
use crate::http::client::{HttpClient, LroResponse};
use crate::models::config::DevCenterConfig;

impl HttpClient {
    fn environment_url(&self, config: &DevCenterConfig, env_name: &str) -> Result<Url, ProvisionError> {
        self.dev_center_url(&[
            "projects",
            &config.project,
            "users",
            config.user_or_default(),
            "environments",
            env_name,
        ])
    }

    /// Get an environment
    pub async fn get_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
    ) -> Result<EnvironmentResource, ProvisionError> {
        let url = self.environment_url(config, env_name)?;
        self.get(url).await
    }

    /// Create or update an environment
    pub async fn put_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
        spec: &EnvironmentSpec,
    ) -> Result<LroResponse, ProvisionError> {
        let url = self.environment_url(config, env_name)?;
        self.put(url, spec).await
    }

    /// Delete an environment
    pub async fn delete_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
    ) -> Result<LroResponse, ProvisionError> {
        let url = self.environment_url(config, env_name)?;
        self.delete(url).await
    }

    /// Get the status of a long-running operation
    pub async fn get_operation_status(&self, location: &Url) -> Result<OperationStatus, ProvisionError> {
        self.get(location.clone()).await
    }
}
