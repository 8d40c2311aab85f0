//! Environment watch loop
//!
//! Polls the remote environment until its resource group exists, then looks
//! for the deployment Dev Center starts inside it.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::watch::session::{WatchEvent, WatchSession};
use crate::watch::source::{is_new_running_deployment, DeploymentHandle, StatusSource};

/// Environment watch options
#[derive(Debug, Clone)]
pub struct Options {
    /// Skip watching entirely
    pub disabled: bool,

    /// Delay before the first poll
    pub initial_delay: Duration,

    /// Delay between later polls
    pub regular_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            disabled: false,
            initial_delay: Duration::from_secs(3),
            regular_delay: Duration::from_secs(5),
        }
    }
}

/// Run the environment watch loop.
///
/// Returns the deployment to hand off to the progress loop, or `None` if the
/// loop was disabled or the session was cancelled first. Query failures are
/// expected while the remote side is still working and only cause a retry.
pub async fn run<S, F>(
    options: &Options,
    session: &WatchSession,
    source: &dyn StatusSource,
    sleep_fn: S,
) -> Option<DeploymentHandle>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    if options.disabled {
        debug!("Progress reporting disabled, not watching environment");
        session.stop();
        return None;
    }

    debug!(session = %session.id(), env = %session.env_name(), "Environment watch starting...");

    let since = session.started_at();
    let predicate = move |d: &DeploymentHandle| is_new_running_deployment(d, since);
    let mut delay = options.initial_delay;
    let mut resource_group: Option<String> = None;

    loop {
        if session.until_cancelled(sleep_fn(delay)).await.is_none() {
            debug!(session = %session.id(), "Environment watch cancelled");
            session.stop();
            return None;
        }
        delay = options.regular_delay;

        let resource_group_id = match &resource_group {
            Some(id) => id.clone(),
            None => {
                let snapshot = match session
                    .until_cancelled(source.environment_snapshot(session.env_name()))
                    .await
                {
                    Some(snapshot) => snapshot,
                    None => {
                        session.stop();
                        return None;
                    }
                };

                let id = match snapshot {
                    Ok(Some(snapshot)) => match snapshot.ready_resource_group() {
                        Some(id) => id.to_string(),
                        None => {
                            debug!("Environment '{}' has no resource group yet", session.env_name());
                            continue;
                        }
                    },
                    Ok(None) => {
                        debug!("Environment '{}' not found yet", session.env_name());
                        continue;
                    }
                    Err(e) => {
                        debug!("Environment poll failed, retrying: {}", e);
                        continue;
                    }
                };

                debug!("Environment '{}' resource group ready: {}", session.env_name(), id);
                let _ = session.apply(WatchEvent::ResourceGroupReady);
                resource_group = Some(id.clone());
                id
            }
        };

        let found = match session
            .until_cancelled(source.find_deployment(&resource_group_id, &predicate))
            .await
        {
            Some(found) => found,
            None => {
                session.stop();
                return None;
            }
        };

        match found {
            Ok(Some(deployment)) => {
                info!(
                    session = %session.id(),
                    "Found deployment '{}' for environment '{}'",
                    deployment.name,
                    session.env_name()
                );
                let _ = session.apply(WatchEvent::DeploymentFound);
                return Some(deployment);
            }
            Ok(None) => {
                debug!("No new deployment in {} yet", resource_group_id);
            }
            Err(e) => {
                debug!("Deployment search failed, retrying: {}", e);
            }
        }
    }
}
