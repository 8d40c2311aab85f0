//! Provision provider tests against the fake API, console and store

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use devcenter_api::models::{
    DeploymentProvisioningState, EnvironmentProvisioningState, OperationState, ParameterDefinition,
    ParameterType,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use devprov::errors::ProvisionError;
use devprov::models::config::DevCenterConfig;
use devprov::models::provision::DestroyOptions;
use devprov::provision::provider::{ProviderOptions, ProvisionProvider};
use devprov::storage::environment::Environment;
use devprov::watch::controller::ProgressOptions;

use crate::fakes::{
    ade_tags, deployment, dev_center_config, environment_resource, lock, operation,
    operation_status, FakeApi, MemoryStore, ScriptedConsole, RESOURCE_GROUP_ID,
};

struct Harness {
    api: Arc<FakeApi>,
    console: Arc<ScriptedConsole>,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        Self {
            api: Arc::new(FakeApi::new()),
            console: Arc::new(ScriptedConsole::default()),
            store: Arc::new(MemoryStore::default()),
        }
    }

    fn provider(&self, env: Environment, defaults: &DevCenterConfig, progress_disabled: bool) -> ProvisionProvider {
        ProvisionProvider::new(
            self.api.clone(),
            self.console.clone(),
            self.store.clone(),
            env,
            defaults,
            ProviderOptions {
                infra_path: PathBuf::from("/nonexistent/devprov-infra"),
                lro_poll_interval: Duration::from_secs(5),
                progress: ProgressOptions::default().with_disabled(progress_disabled),
            },
        )
    }

    fn configured(&self, progress_disabled: bool) -> ProvisionProvider {
        self.provider(Environment::new("feature-1"), &dev_center_config(), progress_disabled)
    }

    fn with_provisioned_environment(&self, outputs: &[(&str, serde_json::Value)]) {
        let config = dev_center_config();
        *lock(&self.api.environment) = Some(environment_resource(
            "feature-1",
            EnvironmentProvisioningState::Succeeded,
            Some(RESOURCE_GROUP_ID),
        ));
        *lock(&self.api.deployments) = vec![deployment(
            "initial",
            DeploymentProvisioningState::Succeeded,
            Utc::now() - ChronoDuration::days(1),
            Some(ade_tags(&config, "feature-1")),
            outputs,
        )];
    }
}

fn parameter(id: &str, param_type: ParameterType, default: Option<serde_json::Value>, required: bool) -> ParameterDefinition {
    ParameterDefinition {
        id: id.to_string(),
        name: None,
        description: None,
        param_type,
        default,
        required,
        read_only: false,
        allowed: None,
    }
}

#[tokio::test]
async fn test_name_and_preview() {
    let harness = Harness::new();
    let provider = harness.configured(true);

    assert_eq!(provider.name(), "Dev Center");
    let err = provider.preview().await.unwrap_err();
    assert_eq!(err.to_string(), "preview is not supported for devcenter");
    assert!(provider.parameters().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_state_requires_valid_config() {
    let harness = Harness::new();
    let provider = harness.provider(Environment::new("feature-1"), &DevCenterConfig::default(), true);

    let err = provider.state().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid devcenter configuration, missing name, project, catalog, environmentType, environmentDefinition"
    );
}

#[tokio::test]
async fn test_state_of_missing_environment() {
    let harness = Harness::new();
    let provider = harness.configured(true);

    let err = provider.state().await.unwrap_err();
    assert!(err.to_string().starts_with("failed getting environment: "));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_state_returns_outputs() {
    let harness = Harness::new();
    harness.with_provisioned_environment(&[("WEB_URI", json!("https://web.example.com"))]);
    let provider = harness.configured(true);

    let state = provider.state().await.unwrap();
    assert_eq!(state.outputs["WEB_URI"].value, json!("https://web.example.com"));
}

#[tokio::test]
async fn test_ensure_env_saves_only_missing_values() {
    let harness = Harness::new();
    harness.console.push_prompt("main");
    harness.console.push_prompt("webapp");
    harness.console.push_prompt("Dev");

    let defaults = DevCenterConfig {
        name: "contoso".to_string(),
        project: "web".to_string(),
        ..Default::default()
    };
    let mut provider = harness.provider(Environment::new("feature-1"), &defaults, true);
    provider.ensure_env().await.unwrap();

    assert_eq!(provider.config().catalog, "main");
    assert_eq!(provider.config().environment_definition, "webapp");
    assert_eq!(provider.config().environment_type, "Dev");
    assert_eq!(provider.config().user, "me");

    let saved = harness.store.saved("feature-1").unwrap();
    assert_eq!(saved.get_string("devCenter.catalog"), Some("main"));
    assert_eq!(saved.get_string("devCenter.environmentDefinition"), Some("webapp"));
    assert_eq!(saved.get_string("devCenter.environmentType"), Some("Dev"));
    assert_eq!(saved.get_string("devCenter.user"), Some("me"));
    assert_eq!(saved.get("devCenter.name"), None);
    assert_eq!(saved.get("devCenter.project"), None);
}

#[tokio::test]
async fn test_ensure_env_prompt_failure_is_returned() {
    let harness = Harness::new();
    let mut provider = harness.provider(Environment::new("feature-1"), &DevCenterConfig::default(), true);

    let err = provider.ensure_env().await.unwrap_err();
    assert!(matches!(err, ProvisionError::PromptError(_)));
    assert_eq!(harness.store.saves(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_creates_environment_with_parameters() {
    let harness = Harness::new();
    lock(&harness.api.definition).parameters = vec![
        parameter("location", ParameterType::String, None, true),
        parameter("sku", ParameterType::String, Some(json!("basic")), false),
        parameter("enabled", ParameterType::Boolean, Some(json!(false)), true),
        parameter("replicas", ParameterType::Integer, None, true),
    ];
    harness.console.push_prompt("westus");
    harness.console.push_confirm(Ok(true));
    *lock(&harness.api.environment_after_put) = Some(environment_resource(
        "feature-1",
        EnvironmentProvisioningState::Succeeded,
        Some(RESOURCE_GROUP_ID),
    ));
    *lock(&harness.api.deployments) = vec![deployment(
        "initial",
        DeploymentProvisioningState::Succeeded,
        Utc::now() - ChronoDuration::days(1),
        Some(ade_tags(&dev_center_config(), "feature-1")),
        &[("WEB_URI", json!("https://web.example.com"))],
    )];
    lock(&harness.api.statuses).extend([
        operation_status(OperationState::Running),
        operation_status(OperationState::Running),
    ]);

    let mut env = Environment::new("feature-1");
    env.set("provision.parameters.replicas", json!(3)).unwrap();
    let mut provider = harness.provider(env, &dev_center_config(), true);

    let result = assert_ok!(provider.deploy(&CancellationToken::new()).await);

    assert_eq!(result.outputs["WEB_URI"].value, json!("https://web.example.com"));
    assert_eq!(result.parameters["location"].value, Some(json!("westus")));
    assert_eq!(result.parameters["sku"].value, Some(json!("basic")));
    assert_eq!(result.parameters["sku"].default_value, Some(json!("basic")));
    assert_eq!(result.parameters["enabled"].value, Some(json!(true)));
    assert_eq!(result.parameters["replicas"].value, Some(json!(3)));
    assert_eq!(result.parameters["replicas"].param_type, "integer");

    let puts = lock(&harness.api.puts).clone();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].environment_type, "Dev");
    assert_eq!(puts[0].catalog_name, "main");
    assert_eq!(puts[0].environment_definition_name, "webapp");
    assert_eq!(puts[0].parameters["location"], json!("westus"));
    assert_eq!(puts[0].parameters["replicas"], json!(3));
    assert_eq!(harness.api.status_polls.load(Ordering::SeqCst), 3);

    let saved = harness.store.saved("feature-1").unwrap();
    assert_eq!(saved.get_string("provision.parameters.location"), Some("westus"));
    assert_eq!(saved.get("provision.parameters.enabled"), Some(&json!(true)));

    assert_eq!(harness.console.lines_containing("[Done] Creating devcenter environment"), 1);
    assert_eq!(harness.console.lines_containing("[Done] Deploying dev center environment"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_updates_existing_environment() {
    let harness = Harness::new();
    harness.with_provisioned_environment(&[]);
    let mut provider = harness.configured(true);

    provider.deploy(&CancellationToken::new()).await.unwrap();
    assert_eq!(harness.console.lines_containing("[Done] Updating devcenter environment"), 1);
    assert_eq!(harness.console.lines_containing("Creating devcenter environment"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_put_failure_fails_spinner() {
    let harness = Harness::new();
    *lock(&harness.api.put_error) = Some(ProvisionError::StatusError {
        status: http::StatusCode::BAD_REQUEST,
        body: "InvalidParameter: location".to_string(),
    });
    let mut provider = harness.configured(true);

    let err = provider.deploy(&CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().starts_with("failed creating environment: "));
    assert_eq!(harness.console.lines_containing("[Failed] Creating devcenter environment"), 1);
    assert_eq!(harness.console.lines_containing("Deploying dev center environment"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_remote_failure_fails_deploying_step() {
    let harness = Harness::new();
    lock(&harness.api.statuses).push_back(operation_status(OperationState::Failed));
    let mut provider = harness.configured(true);

    let err = provider.deploy(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err.root(), ProvisionError::OperationFailed(_)));
    assert_eq!(harness.console.lines_containing("[Failed] Deploying dev center environment"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_warns_about_ignored_templates() {
    let project = std::env::temp_dir().join(format!("devprov-project-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(project.join("infra")).await.unwrap();
    tokio::fs::write(project.join("infra").join("main.bicep"), "param location string")
        .await
        .unwrap();

    let harness = Harness::new();
    harness.with_provisioned_environment(&[]);
    let mut provider = ProvisionProvider::new(
        harness.api.clone(),
        harness.console.clone(),
        harness.store.clone(),
        Environment::new("feature-1"),
        &dev_center_config(),
        ProviderOptions {
            progress: ProgressOptions::default().with_disabled(true),
            ..Default::default()
        },
    );
    provider.initialize(&project).await.unwrap();
    provider.deploy(&CancellationToken::new()).await.unwrap();

    assert_eq!(harness.console.lines_containing("IaC templates were found"), 1);
    tokio::fs::remove_dir_all(&project).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_deploy_reports_progress_until_operation_completes() {
    let harness = Harness::new();
    let config = dev_center_config();
    let later = Utc::now() + ChronoDuration::hours(1);

    *lock(&harness.api.environment_after_put) = Some(environment_resource(
        "feature-1",
        EnvironmentProvisioningState::Succeeded,
        Some(RESOURCE_GROUP_ID),
    ));
    *lock(&harness.api.deployments) = vec![deployment(
        "ade-run",
        DeploymentProvisioningState::Running,
        later,
        Some(ade_tags(&config, "feature-1")),
        &[],
    )];
    *lock(&harness.api.operations) = vec![operation(
        "op1",
        DeploymentProvisioningState::Running,
        later + ChronoDuration::seconds(1),
        "stweb",
    )];
    // succeeds on the poll at 30s
    lock(&harness.api.statuses).extend((0..6).map(|_| operation_status(OperationState::Running)));

    let mut provider = harness.configured(false);
    let result = provider.deploy(&CancellationToken::new()).await.unwrap();
    assert!(result.outputs.is_empty());

    // progress reports at 6s, 16s and 26s
    let reports = harness.api.operation_lists.load(Ordering::SeqCst);
    assert_eq!(reports, 3);
    assert_eq!(harness.console.lines_containing("Creating: Microsoft.Storage/storageAccounts"), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(harness.api.operation_lists.load(Ordering::SeqCst), reports);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_declined() {
    let harness = Harness::new();
    harness.with_provisioned_environment(&[]);
    harness.console.push_confirm(Ok(false));
    let provider = harness.configured(true);

    let err = assert_err!(
        provider
            .destroy(&CancellationToken::new(), DestroyOptions::default())
            .await
    );
    assert!(matches!(err, ProvisionError::DestroyCancelled));
    assert_eq!(err.to_string(), "destroy operation cancelled");
    assert_eq!(harness.api.deletes.load(Ordering::SeqCst), 0);
    assert_eq!(harness.console.lines_containing("[Skipped] Deleting devcenter environment"), 1);
    assert_eq!(harness.console.lines_containing("Environment Definition:"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_prompt_interrupted() {
    let harness = Harness::new();
    harness.with_provisioned_environment(&[]);
    harness
        .console
        .push_confirm(Err(ProvisionError::PromptError("input closed".to_string())));
    let provider = harness.configured(true);

    let err = provider
        .destroy(&CancellationToken::new(), DestroyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::DestroyInterrupted(_)));
    assert!(err.to_string().starts_with("destroy operation interrupted: "));
    assert_eq!(harness.api.deletes.load(Ordering::SeqCst), 0);
    assert_eq!(harness.console.lines_containing("[Failed] Deleting devcenter environment"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_confirmed_invalidates_outputs() {
    let harness = Harness::new();
    harness.with_provisioned_environment(&[
        ("WEB_URI", json!("https://web.example.com")),
        ("API_URI", json!("https://api.example.com")),
    ]);
    harness.console.push_confirm(Ok(true));
    let provider = harness.configured(true);

    let result = provider
        .destroy(&CancellationToken::new(), DestroyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.invalidated_env_keys, vec!["API_URI", "WEB_URI"]);
    assert_eq!(harness.api.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(harness.console.lines_containing("[Done] Deleting devcenter environment"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_forced_skips_confirmation() {
    let harness = Harness::new();
    harness.with_provisioned_environment(&[]);
    let provider = harness.configured(true);

    provider
        .destroy(&CancellationToken::new(), DestroyOptions { force: true })
        .await
        .unwrap();
    assert_eq!(harness.console.lines_containing("[confirm]"), 0);
    assert_eq!(harness.console.lines_containing("WARNING"), 0);
    assert_eq!(harness.api.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_missing_environment() {
    let harness = Harness::new();
    let provider = harness.configured(true);

    let err = provider
        .destroy(&CancellationToken::new(), DestroyOptions { force: true })
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("failed getting devcenter environment: "));
    assert_eq!(harness.api.deletes.load(Ordering::SeqCst), 0);
}
