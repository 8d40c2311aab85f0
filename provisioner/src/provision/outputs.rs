//! Outputs of the latest successful deployment of an environment

use std::collections::HashMap;

use devcenter_api::models::{DeploymentProvisioningState, EnvironmentResource};
use tracing::debug;

use crate::errors::ProvisionError;
use crate::http::api::DevCenterApi;
use crate::models::config::DevCenterConfig;
use crate::models::provision::OutputParameter;

/// Outputs of the most recent successful deployment tagged for `environment`.
///
/// An environment without a resource group has no outputs.
pub async fn resolve_outputs(
    api: &dyn DevCenterApi,
    config: &DevCenterConfig,
    environment: &EnvironmentResource,
) -> Result<HashMap<String, OutputParameter>, ProvisionError> {
    let Some(resource_group_id) = environment
        .resource_group_id
        .as_deref()
        .filter(|id| !id.is_empty())
    else {
        debug!("Environment '{}' has no resource group", environment.name);
        return Ok(HashMap::new());
    };

    let deployments = api.list_deployments(resource_group_id).await?;
    let latest = deployments
        .into_iter()
        .filter(|d| config.matches_deployment_tags(&environment.name, d.tags.as_ref()))
        .filter(|d| d.properties.provisioning_state == DeploymentProvisioningState::Succeeded)
        .max_by_key(|d| d.properties.timestamp);

    let Some(latest) = latest else {
        debug!("No successful deployment found for '{}'", environment.name);
        return Ok(HashMap::new());
    };

    let outputs = latest
        .properties
        .outputs
        .unwrap_or_default()
        .into_iter()
        .map(|(name, output)| {
            (
                name,
                OutputParameter {
                    output_type: output.output_type,
                    value: output.value,
                },
            )
        })
        .collect();

    Ok(outputs)
}
