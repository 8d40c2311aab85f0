//! Starts and hands off the watch loops

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::watch::session::WatchSession;
use crate::watch::source::{ProgressReporterFactory, StatusSource};
use crate::workers::{environment, progress};

/// Progress watch options
#[derive(Debug, Clone, Default)]
pub struct ProgressOptions {
    /// Environment watch loop options
    pub environment: environment::Options,

    /// Progress watch loop options
    pub progress: progress::Options,
}

impl ProgressOptions {
    /// Turn both loops on or off
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.environment.disabled = disabled;
        self.progress.disabled = disabled;
        self
    }
}

/// Watches a provisioning attempt in the background
#[derive(Clone)]
pub struct ProgressWatcher {
    source: Arc<dyn StatusSource>,
    reporters: Arc<dyn ProgressReporterFactory>,
    options: ProgressOptions,
}

impl ProgressWatcher {
    pub fn new(
        source: Arc<dyn StatusSource>,
        reporters: Arc<dyn ProgressReporterFactory>,
        options: ProgressOptions,
    ) -> Self {
        Self {
            source,
            reporters,
            options,
        }
    }

    /// Start watching `env_name` until `scope` is cancelled. Returns
    /// immediately; nothing the watch loops do can fail the caller.
    pub fn start(&self, env_name: &str, scope: &CancellationToken) {
        let session = Arc::new(WatchSession::new(env_name, scope.child_token()));
        let _ = self.spawn(session);
    }

    /// Spawn the environment watch loop for an existing session.
    ///
    /// The returned handle finishes when the environment loop exits, which
    /// is before the progress loop it hands off to.
    pub fn spawn(&self, session: Arc<WatchSession>) -> JoinHandle<()> {
        let source = self.source.clone();
        let reporters = self.reporters.clone();
        let options = self.options.clone();
        let span = tracing::debug_span!("watch", session = %session.id(), env = %session.env_name());

        tokio::spawn(
            async move {
                let deployment = environment::run(
                    &options.environment,
                    &session,
                    source.as_ref(),
                    tokio::time::sleep,
                )
                .await;

                let Some(deployment) = deployment else {
                    return;
                };

                debug!("Handing off to progress watch for '{}'", deployment.name);
                tokio::spawn(
                    async move {
                        progress::run(
                            &options.progress,
                            &session,
                            &deployment,
                            reporters.as_ref(),
                            tokio::time::sleep,
                        )
                        .await;
                    }
                    .in_current_span(),
                );
            }
            .instrument(span),
        )
    }
}
