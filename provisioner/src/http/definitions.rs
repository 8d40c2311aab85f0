//! Environment definition API client

use devcenter_api::models::EnvironmentDefinition;

use crate::errors::ProvisionError;
use crate::http::client::HttpClient;
use crate::models::config::DevCenterConfig;

impl HttpClient {
    /// Get the environment definition selected in `config`
    pub async fn get_environment_definition(
        &self,
        config: &DevCenterConfig,
    ) -> Result<EnvironmentDefinition, ProvisionError> {
        let url = self.dev_center_url(&[
            "projects",
            &config.project,
            "catalogs",
            &config.catalog,
            "environmentDefinitions",
            &config.environment_definition,
        ])?;
        self.get(url).await
    }
}
