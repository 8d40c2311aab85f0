//! Provisioning results

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A parameter passed to an environment definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParameter {
    #[serde(rename = "type")]
    pub param_type: String,
    pub default_value: Option<serde_json::Value>,
    pub value: Option<serde_json::Value>,
}

/// A deployment output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputParameter {
    #[serde(rename = "type")]
    pub output_type: String,
    pub value: serde_json::Value,
}

/// Result of a deploy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployResult {
    pub parameters: HashMap<String, InputParameter>,
    pub outputs: HashMap<String, OutputParameter>,
}

/// Result of a destroy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyResult {
    /// Environment keys that no longer hold valid values
    pub invalidated_env_keys: Vec<String>,
}

/// Current state of a provisioned environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateResult {
    pub outputs: HashMap<String, OutputParameter>,
}

/// Destroy options
#[derive(Debug, Clone, Copy, Default)]
pub struct DestroyOptions {
    /// Skip the confirmation prompt
    pub force: bool,
}
