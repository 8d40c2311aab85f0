//! Watch session bookkeeping

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Phase of a watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// Polling the environment until its resource group exists
    WaitingForResourceGroup,

    /// Searching the resource group for a fresh deployment
    WaitingForDeployment,

    /// Reporting deployment progress
    ReportingProgress,

    /// Done; terminal
    Stopped,
}

/// Watch session event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// The environment reported a resource group
    ResourceGroupReady,

    /// A deployment matching the session was found
    DeploymentFound,

    /// Cancelled or disabled
    Stop,
}

impl WatchPhase {
    /// Next phase for `event`. Phases only move forward.
    pub fn next(self, event: WatchEvent) -> Result<WatchPhase, String> {
        match (self, event) {
            (WatchPhase::WaitingForResourceGroup, WatchEvent::ResourceGroupReady) => {
                Ok(WatchPhase::WaitingForDeployment)
            }
            (WatchPhase::WaitingForDeployment, WatchEvent::DeploymentFound) => {
                Ok(WatchPhase::ReportingProgress)
            }
            (_, WatchEvent::Stop) => Ok(WatchPhase::Stopped),
            (phase, event) => Err(format!("Invalid transition: {:?} -> {:?}", phase, event)),
        }
    }
}

/// Progress-tracking context of one provisioning attempt.
///
/// Shared read-only between the environment and progress loops; the phase is
/// only ever written by whichever loop currently owns the session.
#[derive(Debug)]
pub struct WatchSession {
    id: Uuid,
    env_name: String,
    started_at: DateTime<Utc>,
    scope: CancellationToken,
    phase: Mutex<WatchPhase>,
}

impl WatchSession {
    /// Start a session now
    pub fn new(env_name: impl Into<String>, scope: CancellationToken) -> Self {
        Self::starting_at(env_name, scope, Utc::now())
    }

    /// Start a session with an explicit start time
    pub fn starting_at(
        env_name: impl Into<String>,
        scope: CancellationToken,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            env_name: env_name.into(),
            started_at,
            scope,
            phase: Mutex::new(WatchPhase::WaitingForResourceGroup),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }

    fn lock_phase(&self) -> MutexGuard<'_, WatchPhase> {
        match self.phase.lock() {
            Ok(phase) => phase,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current phase
    pub fn phase(&self) -> WatchPhase {
        *self.lock_phase()
    }

    /// Apply an event to the session phase
    pub fn apply(&self, event: WatchEvent) -> Result<WatchPhase, String> {
        let mut phase = self.lock_phase();
        let next = phase.next(event)?;
        if *phase != next {
            debug!(session = %self.id, env = %self.env_name, "Watch session is now {:?}", next);
        }
        *phase = next;
        Ok(next)
    }

    /// Mark the session stopped
    pub fn stop(&self) {
        let _ = self.apply(WatchEvent::Stop);
    }

    /// Run `fut` unless the scope is cancelled first.
    ///
    /// Returns `None` without polling `fut` when the scope is already
    /// cancelled; an in-flight `fut` is dropped on cancellation.
    pub async fn until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.scope.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.scope.cancelled() => None,
            output = fut => Some(output),
        }
    }
}
