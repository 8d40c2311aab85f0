//! Progress watch loop

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::watch::session::WatchSession;
use crate::watch::source::{DeploymentHandle, ProgressCursor, ProgressReporterFactory};

/// Progress watch options
#[derive(Debug, Clone)]
pub struct Options {
    /// Skip reporting entirely
    pub disabled: bool,

    /// Delay before the first report
    pub initial_delay: Duration,

    /// Delay between later reports
    pub regular_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            disabled: false,
            initial_delay: Duration::from_secs(3),
            regular_delay: Duration::from_secs(10),
        }
    }
}

/// Run the progress watch loop until the session is cancelled.
///
/// Reporting is best effort: a failed report is logged and retried on the
/// next tick, it never ends the loop.
pub async fn run<S, F>(
    options: &Options,
    session: &WatchSession,
    deployment: &DeploymentHandle,
    reporters: &dyn ProgressReporterFactory,
    sleep_fn: S,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    if options.disabled {
        debug!("Progress reporting disabled, not reporting deployment progress");
        session.stop();
        return;
    }

    debug!(session = %session.id(), "Progress watch starting for '{}'...", deployment.name);

    let reporter = reporters.reporter(deployment);
    let mut cursor = ProgressCursor::new(Utc::now());
    let mut delay = options.initial_delay;

    loop {
        if session.until_cancelled(sleep_fn(delay)).await.is_none() {
            break;
        }
        delay = options.regular_delay;

        match session.until_cancelled(reporter.report_since(cursor)).await {
            None => break,
            Some(Ok(next)) => {
                cursor.advance(next);
            }
            Some(Err(e)) => {
                debug!("Progress report failed, retrying next tick: {}", e);
            }
        }
    }

    debug!(session = %session.id(), "Progress watch cancelled");
    session.stop();
}
