//! Resource manager deployment API client

use devcenter_api::models::{Deployment, DeploymentList, DeploymentOperation, DeploymentOperationList};
use url::Url;

use crate::errors::ProvisionError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List every deployment in a resource group
    pub async fn list_deployments(
        &self,
        resource_group_id: &str,
    ) -> Result<Vec<Deployment>, ProvisionError> {
        let mut url = self.management_url(
            resource_group_id,
            &["providers", "Microsoft.Resources", "deployments"],
        )?;

        let mut deployments = Vec::new();
        loop {
            let page: DeploymentList = self.get(url).await?;
            deployments.extend(page.value);
            match page.next_link {
                Some(next) => url = Url::parse(&next)?,
                None => break,
            }
        }

        Ok(deployments)
    }

    /// List every operation of a deployment
    pub async fn list_deployment_operations(
        &self,
        deployment_id: &str,
    ) -> Result<Vec<DeploymentOperation>, ProvisionError> {
        let mut url = self.management_url(deployment_id, &["operations"])?;

        let mut operations = Vec::new();
        loop {
            let page: DeploymentOperationList = self.get(url).await?;
            operations.extend(page.value);
            match page.next_link {
                Some(next) => url = Url::parse(&next)?,
                None => break,
            }
        }

        Ok(operations)
    }
}
