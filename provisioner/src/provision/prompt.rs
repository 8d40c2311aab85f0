//! Interactive resolution of Dev Center selections and parameter values

use std::sync::Arc;

use devcenter_api::models::{EnvironmentDefinition, ParameterDefinition, ParameterType};
use serde_json::{Map, Value};
use tracing::debug;

use crate::console::Console;
use crate::errors::ProvisionError;
use crate::models::config::DevCenterConfig;
use crate::storage::environment::Environment;
use crate::utils::parse_bool;

/// Environment config path holding saved parameter values
pub const PROVISION_PARAMETERS_CONFIG_PATH: &str = "provision.parameters";

/// Asks the operator for whatever the configuration is missing
pub struct Prompter {
    console: Arc<dyn Console>,
}

impl Prompter {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }

    /// Fill the Dev Center, project, catalog and environment definition if unset
    pub async fn prompt_for_config(&self, config: &mut DevCenterConfig) -> Result<(), ProvisionError> {
        if config.name.is_empty() {
            config.name = self.prompt_required("Select a Dev Center").await?;
        }
        if config.project.is_empty() {
            config.project = self.prompt_required("Select a project").await?;
        }
        if config.catalog.is_empty() {
            config.catalog = self.prompt_required("Select a catalog").await?;
        }
        if config.environment_definition.is_empty() {
            config.environment_definition =
                self.prompt_required("Select an environment definition").await?;
        }
        Ok(())
    }

    /// Ask for the environment type to deploy into
    pub async fn prompt_environment_type(
        &self,
        dev_center: &str,
        project: &str,
    ) -> Result<String, ProvisionError> {
        self.prompt_required(&format!(
            "Select an environment type for project '{}' in '{}'",
            project, dev_center
        ))
        .await
    }

    /// Resolve a value for every parameter of `definition`.
    ///
    /// A value saved in the environment wins, then the parameter default.
    /// Required parameters without either are prompted for.
    pub async fn prompt_parameters(
        &self,
        env: &Environment,
        definition: &EnvironmentDefinition,
    ) -> Result<Map<String, Value>, ProvisionError> {
        let mut values = Map::new();

        for param in &definition.parameters {
            let path = format!("{}.{}", PROVISION_PARAMETERS_CONFIG_PATH, param.id);

            if let Some(saved) = env.get(&path) {
                debug!("Using saved value for parameter '{}'", param.id);
                values.insert(param.id.clone(), saved.clone());
                continue;
            }

            if param.read_only || !param.required {
                if let Some(default) = &param.default {
                    values.insert(param.id.clone(), default.clone());
                }
                continue;
            }

            let value = self.prompt_parameter(param).await?;
            values.insert(param.id.clone(), value);
        }

        Ok(values)
    }

    async fn prompt_parameter(&self, param: &ParameterDefinition) -> Result<Value, ProvisionError> {
        let label = param.name.as_deref().unwrap_or(&param.id);
        let message = match &param.description {
            Some(description) => format!("{} ({})", label, description),
            None => label.to_string(),
        };

        if param.param_type == ParameterType::Boolean {
            let default = param.default.as_ref().and_then(Value::as_bool).unwrap_or(false);
            return Ok(Value::Bool(self.console.confirm(&message, default).await?));
        }

        let default = param.default.as_ref().map(display_value);
        let raw = self.console.prompt(&message, default.as_deref()).await?;
        let value = parse_parameter_value(param.param_type, &raw)?;

        if let Some(allowed) = &param.allowed {
            if !allowed.contains(&value) {
                return Err(ProvisionError::PromptError(format!(
                    "'{}' is not an allowed value for '{}'",
                    raw, param.id
                )));
            }
        }

        Ok(value)
    }

    async fn prompt_required(&self, message: &str) -> Result<String, ProvisionError> {
        let answer = self.console.prompt(message, None).await?;
        if answer.is_empty() {
            return Err(ProvisionError::PromptError(format!("a value is required: {}", message)));
        }
        Ok(answer)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert operator input into a value of the declared parameter type
pub fn parse_parameter_value(param_type: ParameterType, raw: &str) -> Result<Value, ProvisionError> {
    let invalid = || {
        ProvisionError::PromptError(format!("'{}' is not a valid {}", raw, param_type.as_str()))
    };

    match param_type {
        ParameterType::String => Ok(Value::String(raw.to_string())),
        ParameterType::Integer => raw.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
        ParameterType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        ParameterType::Boolean => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
        ParameterType::Array => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Array(_)) => Ok(value),
            _ => Err(invalid()),
        },
        ParameterType::Object => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Ok(value),
            _ => Err(invalid()),
        },
    }
}
