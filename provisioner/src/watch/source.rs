//! Contracts between the watch loops and the remote side

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::ProvisionError;

/// Provisioning state of an environment, as far as watching is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentState {
    Creating,
    Other,
}

/// Point-in-time read of a remote environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub provisioning_state: EnvironmentState,

    /// Empty until the backing resource group exists
    pub resource_group_id: String,
}

impl EnvironmentSnapshot {
    /// Resource group to search once the environment is past creation
    pub fn ready_resource_group(&self) -> Option<&str> {
        if self.provisioning_state == EnvironmentState::Creating || self.resource_group_id.is_empty()
        {
            None
        } else {
            Some(&self.resource_group_id)
        }
    }
}

/// Provisioning state of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    Running,
    Succeeded,
    Failed,
    Other,
}

/// A deployment discovered inside an environment's resource group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    pub id: String,
    pub name: String,
    pub provisioning_state: DeploymentState,
    pub started_at: DateTime<Utc>,
}

/// Filter applied to candidate deployments
pub type DeploymentPredicate = dyn Fn(&DeploymentHandle) -> bool + Send + Sync;

/// A running deployment that started strictly after `since`
pub fn is_new_running_deployment(deployment: &DeploymentHandle, since: DateTime<Utc>) -> bool {
    deployment.provisioning_state == DeploymentState::Running && deployment.started_at > since
}

/// Watermark of reported progress events. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProgressCursor(DateTime<Utc>);

impl ProgressCursor {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Move to `next` if it is later; returns whether the cursor moved
    pub fn advance(&mut self, next: ProgressCursor) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// Remote status queries used by the environment watch loop
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current state of an environment, `None` if it does not exist (yet)
    async fn environment_snapshot(
        &self,
        env_name: &str,
    ) -> Result<Option<EnvironmentSnapshot>, ProvisionError>;

    /// First deployment in the resource group accepted by `predicate`
    async fn find_deployment(
        &self,
        resource_group_id: &str,
        predicate: &DeploymentPredicate,
    ) -> Result<Option<DeploymentHandle>, ProvisionError>;
}

/// Reports provisioning events of one deployment
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Report every event after `cursor`; returns the cursor to use next time
    async fn report_since(&self, cursor: ProgressCursor) -> Result<ProgressCursor, ProvisionError>;
}

/// Creates a reporter bound to a deployment
pub trait ProgressReporterFactory: Send + Sync {
    fn reporter(&self, deployment: &DeploymentHandle) -> Arc<dyn ProgressReporter>;
}
