//! API models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ================================ DEV CENTER ===================================== //

/// Provisioning state reported for an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentProvisioningState {
    Creating,
    Updating,
    Deleting,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Other,
}

/// Environment resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentResource {
    pub name: String,
    #[serde(default)]
    pub environment_type: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default)]
    pub environment_definition_name: String,
    #[serde(default)]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub provisioning_state: Option<EnvironmentProvisioningState>,
    #[serde(default)]
    pub resource_group_id: Option<String>,
}

/// Environment create/update request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    pub environment_type: String,
    pub catalog_name: String,
    pub environment_definition_name: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty", default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// Parameter type of an environment definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Integer => "integer",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }
}

/// Parameter declared by an environment definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
}

/// Environment definition from a catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}

/// Status of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Other,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::Failed | OperationState::Canceled
        )
    }
}

/// Long-running operation status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub status: OperationState,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

// ============================= RESOURCE MANAGER ================================== //

/// Provisioning state of a resource manager deployment or operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentProvisioningState {
    Accepted,
    Running,
    Creating,
    Created,
    Deleting,
    Deleted,
    Ready,
    Updating,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Other,
}

/// Output value of a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputValue {
    #[serde(rename = "type", default)]
    pub output_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Deployment properties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProperties {
    pub provisioning_state: DeploymentProvisioningState,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub outputs: Option<HashMap<String, OutputValue>>,
}

/// Resource manager deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    pub properties: DeploymentProperties,
}

/// Page of deployments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentList {
    #[serde(default)]
    pub value: Vec<Deployment>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Resource targeted by a deployment operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResource {
    pub id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_name: String,
}

/// Deployment operation properties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOperationProperties {
    pub provisioning_state: DeploymentProvisioningState,
    #[serde(default)]
    pub provisioning_operation: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub target_resource: Option<TargetResource>,
}

/// A single operation within a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOperation {
    pub id: String,
    pub operation_id: String,
    pub properties: DeploymentOperationProperties,
}

/// Page of deployment operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOperationList {
    #[serde(default)]
    pub value: Vec<DeploymentOperation>,
    #[serde(default)]
    pub next_link: Option<String>,
}
