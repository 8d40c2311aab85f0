//! Dev Center provision provider

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use devcenter_api::models::{EnvironmentDefinition, EnvironmentSpec};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::console::{with_highlight_format, with_warning_format, Console, StepResult};
use crate::errors::{ProvisionError, ResultExt};
use crate::filesys::dir::Dir;
use crate::http::api::DevCenterApi;
use crate::models::config::{
    DevCenterConfig, DEFAULT_USER, DEV_CENTER_CATALOG_PATH, DEV_CENTER_ENV_DEFINITION_PATH,
    DEV_CENTER_ENV_TYPE_PATH, DEV_CENTER_NAME_PATH, DEV_CENTER_PROJECT_PATH, DEV_CENTER_USER_PATH,
};
use crate::models::provision::{
    DeployResult, DestroyOptions, DestroyResult, InputParameter, StateResult,
};
use crate::provision::lro::OperationPoller;
use crate::provision::outputs::resolve_outputs;
use crate::provision::progress::ConsoleProgressReporters;
use crate::provision::prompt::{Prompter, PROVISION_PARAMETERS_CONFIG_PATH};
use crate::provision::source::DevCenterStatusSource;
use crate::storage::environment::{Environment, EnvironmentStore};
use crate::watch::controller::{ProgressOptions, ProgressWatcher};

/// Provider options
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Infrastructure template directory
    pub infra_path: PathBuf,

    /// Interval between long-running operation status checks
    pub lro_poll_interval: Duration,

    /// Background progress reporting
    pub progress: ProgressOptions,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            infra_path: PathBuf::from("infra"),
            lro_poll_interval: Duration::from_secs(5),
            progress: ProgressOptions::default(),
        }
    }
}

/// Provisions environments through Azure Deployment Environments
pub struct ProvisionProvider {
    api: Arc<dyn DevCenterApi>,
    console: Arc<dyn Console>,
    store: Arc<dyn EnvironmentStore>,
    prompter: Prompter,
    env: Environment,
    config: DevCenterConfig,
    options: ProviderOptions,
}

impl ProvisionProvider {
    /// Create a provider for `env`. Values saved in the environment take
    /// precedence over `defaults`.
    pub fn new(
        api: Arc<dyn DevCenterApi>,
        console: Arc<dyn Console>,
        store: Arc<dyn EnvironmentStore>,
        env: Environment,
        defaults: &DevCenterConfig,
        options: ProviderOptions,
    ) -> Self {
        let config = env.dev_center_config().merge(defaults);
        Self {
            api,
            prompter: Prompter::new(console.clone()),
            console,
            store,
            env,
            config,
            options,
        }
    }

    pub fn name(&self) -> &'static str {
        "Dev Center"
    }

    pub fn config(&self) -> &DevCenterConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Resolve the infra path against the project and make sure the
    /// environment is fully configured
    pub async fn initialize(&mut self, project_path: &Path) -> Result<(), ProvisionError> {
        self.options.infra_path = project_path.join(&self.options.infra_path);
        self.ensure_env().await
    }

    /// Prompt for missing Dev Center selections and save them with the
    /// environment. Values configured elsewhere are not copied.
    pub async fn ensure_env(&mut self) -> Result<(), ProvisionError> {
        let current = self.config.clone();
        self.prompter.prompt_for_config(&mut self.config).await?;

        if self.config.environment_type.is_empty() {
            self.config.environment_type = self
                .prompter
                .prompt_environment_type(&self.config.name, &self.config.project)
                .await?;
        }

        if self.config.user.is_empty() {
            self.config.user = DEFAULT_USER.to_string();
        }

        let fields = [
            (DEV_CENTER_NAME_PATH, &current.name, &self.config.name),
            (DEV_CENTER_PROJECT_PATH, &current.project, &self.config.project),
            (DEV_CENTER_CATALOG_PATH, &current.catalog, &self.config.catalog),
            (
                DEV_CENTER_ENV_TYPE_PATH,
                &current.environment_type,
                &self.config.environment_type,
            ),
            (
                DEV_CENTER_ENV_DEFINITION_PATH,
                &current.environment_definition,
                &self.config.environment_definition,
            ),
            (DEV_CENTER_USER_PATH, &current.user, &self.config.user),
        ];
        for (path, before, after) in fields {
            if before.is_empty() {
                self.env.set(path, Value::String(after.clone()))?;
            }
        }

        self.store
            .save(&self.env)
            .await
            .context("failed saving environment")
    }

    /// Outputs of the environment's latest successful deployment
    pub async fn state(&self) -> Result<StateResult, ProvisionError> {
        self.config.ensure_valid()?;

        let environment = self
            .api
            .get_environment(&self.config, self.env.name())
            .await
            .context("failed getting environment")?;

        let outputs = resolve_outputs(self.api.as_ref(), &self.config, &environment)
            .await
            .context("failed getting environment outputs")?;

        Ok(StateResult { outputs })
    }

    /// Create or update the environment and wait for it to be provisioned.
    ///
    /// Deployment progress is reported in the background until the remote
    /// operation completes or `scope` is cancelled.
    pub async fn deploy(&mut self, scope: &CancellationToken) -> Result<DeployResult, ProvisionError> {
        self.config.ensure_valid()?;

        if self.has_infra_templates().await {
            self.console.message(&with_warning_format(&format!(
                "WARNING: IaC templates were found at '{}'. IaC templates are not supported for Dev Center environments and will be ignored.\n",
                self.options.infra_path.display()
            )));
        }

        let definition = self
            .api
            .get_environment_definition(&self.config)
            .await
            .context("failed getting environment definition")?;

        let values = self
            .prompter
            .prompt_parameters(&self.env, &definition)
            .await
            .context("failed prompting for parameters")?;

        for (key, value) in &values {
            let path = format!("{}.{}", PROVISION_PARAMETERS_CONFIG_PATH, key);
            self.env
                .set(&path, value.clone())
                .context(format!("failed setting config value {}", path))?;
        }

        self.store
            .save(&self.env)
            .await
            .context("failed saving environment")?;

        let env_name = self.env.name().to_string();
        let exists = self.api.get_environment(&self.config, &env_name).await.is_ok();
        let spinner = if exists {
            format!("Updating devcenter environment {}", with_highlight_format(&env_name))
        } else {
            format!("Creating devcenter environment {}", with_highlight_format(&env_name))
        };

        let spec = EnvironmentSpec {
            environment_type: self.config.environment_type.clone(),
            catalog_name: self.config.catalog.clone(),
            environment_definition_name: self.config.environment_definition.clone(),
            parameters: values.clone(),
        };

        self.console.show_spinner(&spinner);
        let response = match self.api.put_environment(&self.config, &env_name, &spec).await {
            Ok(response) => response,
            Err(e) => {
                self.console.stop_spinner(&spinner, StepResult::Failed);
                return Err(e.context("failed creating environment"));
            }
        };
        self.console.stop_spinner(&spinner, StepResult::Done);

        let spinner = "Deploying dev center environment";
        self.console.show_spinner(spinner);

        let polling_scope = scope.child_token();
        let polling_guard = polling_scope.clone().drop_guard();
        self.progress_watcher(&env_name).start(&env_name, &polling_scope);

        let poller = OperationPoller::new(self.api.clone(), response, self.options.lro_poll_interval);
        let result = poller.poll_until_done(scope).await;
        drop(polling_guard);

        if let Err(e) = result {
            self.console.stop_spinner(spinner, StepResult::Failed);
            return Err(e.context("failed creating environment"));
        }

        let environment = match self.api.get_environment(&self.config, &env_name).await {
            Ok(environment) => environment,
            Err(e) => {
                self.console.stop_spinner(spinner, StepResult::Failed);
                return Err(e.context("failed getting environment"));
            }
        };
        self.console.stop_spinner(spinner, StepResult::Done);
        info!("Environment '{}' provisioned", env_name);

        let outputs = resolve_outputs(self.api.as_ref(), &self.config, &environment)
            .await
            .context("failed getting environment outputs")?;

        Ok(DeployResult {
            parameters: create_input_parameters(&definition, &values),
            outputs,
        })
    }

    pub async fn preview(&self) -> Result<DeployResult, ProvisionError> {
        Err(ProvisionError::Unsupported(
            "preview is not supported for devcenter".to_string(),
        ))
    }

    /// Delete the environment; unless forced the operator must confirm first
    pub async fn destroy(
        &self,
        scope: &CancellationToken,
        options: DestroyOptions,
    ) -> Result<DestroyResult, ProvisionError> {
        self.config.ensure_valid()?;

        let env_name = self.env.name();
        let spinner = format!("Deleting devcenter environment {}", with_highlight_format(env_name));

        if !options.force {
            self.console.message(&with_warning_format(
                "WARNING: This will delete the following Dev Center environment and all of its resources:\n",
            ));
            self.console
                .message(&format!("Dev Center: {}", with_highlight_format(&self.config.name)));
            self.console
                .message(&format!("Project: {}", with_highlight_format(&self.config.project)));
            self.console.message(&format!(
                "Environment Type: {}",
                with_highlight_format(&self.config.environment_type)
            ));
            self.console.message(&format!(
                "Environment Definition: {}",
                with_highlight_format(&self.config.environment_definition)
            ));
            self.console
                .message(&format!("Environment: {}\n", with_highlight_format(env_name)));

            let confirmed = match self
                .console
                .confirm("Are you sure you want to continue?", false)
                .await
            {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    self.console.message("");
                    self.console.show_spinner(&spinner);
                    self.console.stop_spinner(&spinner, StepResult::Failed);
                    return Err(ProvisionError::DestroyInterrupted(e.to_string()));
                }
            };

            self.console.message("");

            if !confirmed {
                self.console.show_spinner(&spinner);
                self.console.stop_spinner(&spinner, StepResult::Skipped);
                return Err(ProvisionError::DestroyCancelled);
            }
        }

        let environment = self
            .api
            .get_environment(&self.config, env_name)
            .await
            .context("failed getting devcenter environment")?;

        let outputs = resolve_outputs(self.api.as_ref(), &self.config, &environment)
            .await
            .context("failed getting environment outputs")?;

        self.console.show_spinner(&spinner);
        let response = match self.api.delete_environment(&self.config, env_name).await {
            Ok(response) => response,
            Err(e) => {
                self.console.stop_spinner(&spinner, StepResult::Failed);
                return Err(e.context("failed deleting environment"));
            }
        };

        let poller = OperationPoller::new(self.api.clone(), response, self.options.lro_poll_interval);
        if let Err(e) = poller.poll_until_done(scope).await {
            self.console.stop_spinner(&spinner, StepResult::Failed);
            return Err(e.context("failed deleting environment"));
        }
        self.console.stop_spinner(&spinner, StepResult::Done);

        let mut invalidated_env_keys: Vec<String> = outputs.into_keys().collect();
        invalidated_env_keys.sort();
        Ok(DestroyResult { invalidated_env_keys })
    }

    /// Provisioning parameters are not exposed for Dev Center environments
    pub async fn parameters(&self) -> Result<Vec<InputParameter>, ProvisionError> {
        Ok(Vec::new())
    }

    fn progress_watcher(&self, env_name: &str) -> ProgressWatcher {
        ProgressWatcher::new(
            Arc::new(DevCenterStatusSource::new(
                self.api.clone(),
                self.config.clone(),
                env_name,
            )),
            Arc::new(ConsoleProgressReporters::new(
                self.api.clone(),
                self.console.clone(),
            )),
            self.options.progress.clone(),
        )
    }

    async fn has_infra_templates(&self) -> bool {
        match Dir::new(&self.options.infra_path).has_entries().await {
            Ok(has_entries) => has_entries,
            Err(e) => {
                debug!("Unable to read {}: {}", self.options.infra_path.display(), e);
                false
            }
        }
    }
}

/// Input parameters reported back for each parameter of `definition`
pub fn create_input_parameters(
    definition: &EnvironmentDefinition,
    values: &Map<String, Value>,
) -> HashMap<String, InputParameter> {
    definition
        .parameters
        .iter()
        .map(|param| {
            (
                param.id.clone(),
                InputParameter {
                    param_type: param.param_type.as_str().to_string(),
                    default_value: param.default.clone(),
                    value: values.get(&param.id).cloned(),
                },
            )
        })
        .collect()
}
