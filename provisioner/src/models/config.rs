//! Dev Center configuration

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ProvisionError;

/// Tags stamped by Dev Center on the deployments it starts
pub const DEPLOYMENT_TAG_DEV_CENTER_NAME: &str = "AdeDevCenterName";
pub const DEPLOYMENT_TAG_DEV_CENTER_PROJECT: &str = "AdeProjectName";
pub const DEPLOYMENT_TAG_ENVIRONMENT_TYPE: &str = "AdeEnvironmentTypeName";
pub const DEPLOYMENT_TAG_ENVIRONMENT_NAME: &str = "AdeEnvironmentName";

/// Environment config paths holding Dev Center selections
pub const DEV_CENTER_NAME_PATH: &str = "devCenter.name";
pub const DEV_CENTER_PROJECT_PATH: &str = "devCenter.project";
pub const DEV_CENTER_CATALOG_PATH: &str = "devCenter.catalog";
pub const DEV_CENTER_ENV_TYPE_PATH: &str = "devCenter.environmentType";
pub const DEV_CENTER_ENV_DEFINITION_PATH: &str = "devCenter.environmentDefinition";
pub const DEV_CENTER_USER_PATH: &str = "devCenter.user";

/// Default user scope for environment requests
pub const DEFAULT_USER: &str = "me";

/// Which Dev Center, project, catalog and definition an environment comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevCenterConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub catalog: String,

    #[serde(default)]
    pub environment_type: String,

    #[serde(default)]
    pub environment_definition: String,

    #[serde(default)]
    pub user: String,
}

impl DevCenterConfig {
    /// Check that everything needed to address an environment is set
    pub fn ensure_valid(&self) -> Result<(), ProvisionError> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("project", &self.project),
            ("catalog", &self.catalog),
            ("environmentType", &self.environment_type),
            ("environmentDefinition", &self.environment_definition),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::InvalidConfig(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }

    /// Fill every empty field from `fallback`
    pub fn merge(mut self, fallback: &DevCenterConfig) -> Self {
        fn fill(value: &mut String, fallback: &str) {
            if value.is_empty() {
                *value = fallback.to_string();
            }
        }

        fill(&mut self.name, &fallback.name);
        fill(&mut self.project, &fallback.project);
        fill(&mut self.catalog, &fallback.catalog);
        fill(&mut self.environment_type, &fallback.environment_type);
        fill(&mut self.environment_definition, &fallback.environment_definition);
        fill(&mut self.user, &fallback.user);
        self
    }

    /// User scope used in request paths
    pub fn user_or_default(&self) -> &str {
        if self.user.is_empty() {
            DEFAULT_USER
        } else {
            &self.user
        }
    }

    /// Whether a deployment's tags say it belongs to `env_name` in this Dev Center
    pub fn matches_deployment_tags(
        &self,
        env_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> bool {
        let Some(tags) = tags else {
            return false;
        };

        [
            (DEPLOYMENT_TAG_DEV_CENTER_NAME, self.name.as_str()),
            (DEPLOYMENT_TAG_DEV_CENTER_PROJECT, self.project.as_str()),
            (DEPLOYMENT_TAG_ENVIRONMENT_TYPE, self.environment_type.as_str()),
            (DEPLOYMENT_TAG_ENVIRONMENT_NAME, env_name),
        ]
        .iter()
        .all(|(tag, expected)| {
            tags.get(*tag)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
        })
    }
}
