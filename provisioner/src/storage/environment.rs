//! Per-environment configuration storage

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::ProvisionError;
use crate::models::config::{
    DevCenterConfig, DEV_CENTER_CATALOG_PATH, DEV_CENTER_ENV_DEFINITION_PATH,
    DEV_CENTER_ENV_TYPE_PATH, DEV_CENTER_NAME_PATH, DEV_CENTER_PROJECT_PATH, DEV_CENTER_USER_PATH,
};
use crate::storage::layout::StorageLayout;

/// A local environment and its configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    name: String,
    config: Value,
}

impl Environment {
    /// Create an environment with an empty configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Value::Object(Map::new()),
        }
    }

    /// Create an environment from an existing configuration document
    pub fn with_config(name: impl Into<String>, config: Value) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Look up a dotted path such as `provision.parameters.location`
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.config, |node, key| node.as_object()?.get(key))
    }

    /// Look up a dotted path holding a string
    pub fn get_string(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Set a dotted path, creating intermediate objects as needed
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ProvisionError> {
        let keys: Vec<&str> = path.split('.').collect();
        if keys.iter().any(|k| k.is_empty()) {
            return Err(ProvisionError::ConfigError(format!("invalid config path '{}'", path)));
        }

        let (last, parents) = keys
            .split_last()
            .ok_or_else(|| ProvisionError::ConfigError("empty config path".to_string()))?;

        let mut node = &mut self.config;
        for key in parents {
            let object = node.as_object_mut().ok_or_else(|| {
                ProvisionError::ConfigError(format!("'{}' is not an object in path '{}'", key, path))
            })?;
            node = object
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let object = node.as_object_mut().ok_or_else(|| {
            ProvisionError::ConfigError(format!("parent of '{}' is not an object", path))
        })?;
        object.insert(last.to_string(), value);
        Ok(())
    }

    /// Dev Center selections saved for this environment
    pub fn dev_center_config(&self) -> DevCenterConfig {
        let read = |path: &str| self.get_string(path).unwrap_or_default().to_string();

        DevCenterConfig {
            name: read(DEV_CENTER_NAME_PATH),
            project: read(DEV_CENTER_PROJECT_PATH),
            catalog: read(DEV_CENTER_CATALOG_PATH),
            environment_type: read(DEV_CENTER_ENV_TYPE_PATH),
            environment_definition: read(DEV_CENTER_ENV_DEFINITION_PATH),
            user: read(DEV_CENTER_USER_PATH),
        }
    }
}

/// Loads and saves environments
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Load an environment, or an empty one if it was never saved
    async fn load(&self, name: &str) -> Result<Environment, ProvisionError>;

    /// Persist an environment
    async fn save(&self, env: &Environment) -> Result<(), ProvisionError>;
}

/// Environment store backed by JSON files in the state directory
pub struct FileEnvironmentStore {
    layout: StorageLayout,
}

impl FileEnvironmentStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl EnvironmentStore for FileEnvironmentStore {
    async fn load(&self, name: &str) -> Result<Environment, ProvisionError> {
        let file = self.layout.environment_config_file(name);
        match file.read_json_opt::<Value>().await? {
            Some(config) => Ok(Environment::with_config(name, config)),
            None => {
                debug!("No saved config for environment '{}'", name);
                Ok(Environment::new(name))
            }
        }
    }

    async fn save(&self, env: &Environment) -> Result<(), ProvisionError> {
        let file = self.layout.environment_config_file(env.name());
        debug!("Saving environment '{}' to {}", env.name(), file.path().display());
        file.write_json(env.config()).await
    }
}
