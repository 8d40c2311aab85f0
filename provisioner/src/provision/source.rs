//! Status queries backed by the Dev Center and resource manager APIs

use std::sync::Arc;

use async_trait::async_trait;
use devcenter_api::models::{Deployment, DeploymentProvisioningState, EnvironmentProvisioningState};

use crate::errors::ProvisionError;
use crate::http::api::DevCenterApi;
use crate::models::config::DevCenterConfig;
use crate::watch::source::{
    DeploymentHandle, DeploymentPredicate, DeploymentState, EnvironmentSnapshot, EnvironmentState,
    StatusSource,
};

/// Status source for environments of one Dev Center configuration
pub struct DevCenterStatusSource {
    api: Arc<dyn DevCenterApi>,
    config: DevCenterConfig,
    env_name: String,
}

impl DevCenterStatusSource {
    pub fn new(api: Arc<dyn DevCenterApi>, config: DevCenterConfig, env_name: impl Into<String>) -> Self {
        Self {
            api,
            config,
            env_name: env_name.into(),
        }
    }
}

pub fn deployment_state(state: &DeploymentProvisioningState) -> DeploymentState {
    match state {
        DeploymentProvisioningState::Running
        | DeploymentProvisioningState::Accepted
        | DeploymentProvisioningState::Creating
        | DeploymentProvisioningState::Updating => DeploymentState::Running,
        DeploymentProvisioningState::Succeeded => DeploymentState::Succeeded,
        DeploymentProvisioningState::Failed | DeploymentProvisioningState::Canceled => {
            DeploymentState::Failed
        }
        _ => DeploymentState::Other,
    }
}

pub fn deployment_handle(deployment: &Deployment) -> DeploymentHandle {
    DeploymentHandle {
        id: deployment.id.clone(),
        name: deployment.name.clone(),
        provisioning_state: deployment_state(&deployment.properties.provisioning_state),
        started_at: deployment.properties.timestamp,
    }
}

#[async_trait]
impl StatusSource for DevCenterStatusSource {
    async fn environment_snapshot(
        &self,
        env_name: &str,
    ) -> Result<Option<EnvironmentSnapshot>, ProvisionError> {
        let environment = match self.api.get_environment(&self.config, env_name).await {
            Ok(environment) => environment,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let provisioning_state = match environment.provisioning_state {
            Some(EnvironmentProvisioningState::Creating) => EnvironmentState::Creating,
            _ => EnvironmentState::Other,
        };

        Ok(Some(EnvironmentSnapshot {
            provisioning_state,
            resource_group_id: environment.resource_group_id.unwrap_or_default(),
        }))
    }

    async fn find_deployment(
        &self,
        resource_group_id: &str,
        predicate: &DeploymentPredicate,
    ) -> Result<Option<DeploymentHandle>, ProvisionError> {
        let deployments = self.api.list_deployments(resource_group_id).await?;

        let found = deployments
            .iter()
            .filter(|d| self.config.matches_deployment_tags(&self.env_name, d.tags.as_ref()))
            .map(deployment_handle)
            .filter(|d| predicate(d))
            .max_by_key(|d| d.started_at);

        Ok(found)
    }
}
