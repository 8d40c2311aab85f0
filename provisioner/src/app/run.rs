//! Runs a single provisioning command

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::console::TerminalConsole;
use crate::errors::ProvisionError;
use crate::http::client::HttpClient;
use crate::models::provision::DestroyOptions;
use crate::provision::provider::ProvisionProvider;
use crate::storage::environment::{EnvironmentStore, FileEnvironmentStore};

/// Provisioning command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Deploy,
    Destroy { force: bool },
    State,
}

/// Run `command` against the configured environment.
///
/// `shutdown_signal` and the operation timeout cancel the command; the
/// result is returned as JSON for printing.
pub async fn run(
    options: AppOptions,
    command: Command,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<Value, ProvisionError> {
    let mut provider = init_provider(&options).await?;

    let scope = CancellationToken::new();
    let canceller = tokio::spawn(cancel_on(
        scope.clone(),
        shutdown_signal,
        options.operation_timeout,
    ));

    let result = tokio::select! {
        biased;
        _ = scope.cancelled() => Err(ProvisionError::Cancelled),
        result = execute(&mut provider, command, &scope) => result,
    };

    canceller.abort();
    result
}

async fn init_provider(options: &AppOptions) -> Result<ProvisionProvider, ProvisionError> {
    if options.endpoint.is_empty() {
        return Err(ProvisionError::ConfigError(
            "no Dev Center endpoint configured".to_string(),
        ));
    }
    let token = options.access_token.clone().ok_or_else(|| {
        ProvisionError::ConfigError("no access token configured".to_string())
    })?;

    let api = Arc::new(HttpClient::new(
        &options.endpoint,
        &options.management_endpoint,
        SecretString::from(token),
    )?);
    let console = Arc::new(TerminalConsole::new());
    let store = Arc::new(FileEnvironmentStore::new(options.layout()));

    let env = store.load(&options.env_name).await?;
    info!("Loaded environment '{}'", env.name());

    let mut provider = ProvisionProvider::new(
        api,
        console,
        store,
        env,
        &options.dev_center,
        options.provider.clone(),
    );
    provider.initialize(&options.project_dir).await?;

    Ok(provider)
}

async fn execute(
    provider: &mut ProvisionProvider,
    command: Command,
    scope: &CancellationToken,
) -> Result<Value, ProvisionError> {
    info!("Running {:?} with provider '{}'", command, provider.name());

    let value = match command {
        Command::Deploy => serde_json::to_value(provider.deploy(scope).await?)?,
        Command::Destroy { force } => {
            serde_json::to_value(provider.destroy(scope, DestroyOptions { force }).await?)?
        }
        Command::State => serde_json::to_value(provider.state().await?)?,
    };
    Ok(value)
}

async fn cancel_on(
    scope: CancellationToken,
    shutdown_signal: impl Future<Output = ()>,
    timeout: Option<Duration>,
) {
    let timeout_elapsed = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, cancelling...");
        }
        _ = timeout_elapsed => {
            warn!("Operation timed out after {:?}, cancelling...", timeout.unwrap_or_default());
        }
    }
    scope.cancel();
}
