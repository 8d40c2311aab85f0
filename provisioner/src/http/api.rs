//! Dev Center API surface used by the provisioner

use async_trait::async_trait;
use devcenter_api::models::{
    Deployment, DeploymentOperation, EnvironmentDefinition, EnvironmentResource, EnvironmentSpec,
    OperationStatus,
};
use url::Url;

use crate::errors::ProvisionError;
use crate::http::client::{HttpClient, LroResponse};
use crate::models::config::DevCenterConfig;

/// Dev Center API trait for testability
#[async_trait]
pub trait DevCenterApi: Send + Sync {
    async fn get_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
    ) -> Result<EnvironmentResource, ProvisionError>;

    async fn put_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
        spec: &EnvironmentSpec,
    ) -> Result<LroResponse, ProvisionError>;

    async fn delete_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
    ) -> Result<LroResponse, ProvisionError>;

    async fn get_operation_status(&self, location: &Url) -> Result<OperationStatus, ProvisionError>;

    async fn get_environment_definition(
        &self,
        config: &DevCenterConfig,
    ) -> Result<EnvironmentDefinition, ProvisionError>;

    async fn list_deployments(&self, resource_group_id: &str) -> Result<Vec<Deployment>, ProvisionError>;

    async fn list_deployment_operations(
        &self,
        deployment_id: &str,
    ) -> Result<Vec<DeploymentOperation>, ProvisionError>;
}

#[async_trait]
impl DevCenterApi for HttpClient {
    async fn get_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
    ) -> Result<EnvironmentResource, ProvisionError> {
        HttpClient::get_environment(self, config, env_name).await
    }

    async fn put_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
        spec: &EnvironmentSpec,
    ) -> Result<LroResponse, ProvisionError> {
        HttpClient::put_environment(self, config, env_name, spec).await
    }

    async fn delete_environment(
        &self,
        config: &DevCenterConfig,
        env_name: &str,
    ) -> Result<LroResponse, ProvisionError> {
        HttpClient::delete_environment(self, config, env_name).await
    }

    async fn get_operation_status(&self, location: &Url) -> Result<OperationStatus, ProvisionError> {
        HttpClient::get_operation_status(self, location).await
    }

    async fn get_environment_definition(
        &self,
        config: &DevCenterConfig,
    ) -> Result<EnvironmentDefinition, ProvisionError> {
        HttpClient::get_environment_definition(self, config).await
    }

    async fn list_deployments(&self, resource_group_id: &str) -> Result<Vec<Deployment>, ProvisionError> {
        HttpClient::list_deployments(self, resource_group_id).await
    }

    async fn list_deployment_operations(
        &self,
        deployment_id: &str,
    ) -> Result<Vec<DeploymentOperation>, ProvisionError> {
        HttpClient::list_deployment_operations(self, deployment_id).await
    }
}
