//! Deployment progress display

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use devcenter_api::models::DeploymentOperation;

use crate::console::{with_gray_format, with_highlight_format, Console};
use crate::errors::ProvisionError;
use crate::http::api::DevCenterApi;
use crate::provision::source::deployment_state;
use crate::utils::{format_duration, parse_iso8601_duration};
use crate::watch::source::{
    DeploymentHandle, DeploymentState, ProgressCursor, ProgressReporter, ProgressReporterFactory,
};

/// Prints resource-level progress of one deployment
pub struct DeploymentProgressDisplay {
    api: Arc<dyn DevCenterApi>,
    console: Arc<dyn Console>,
    deployment_id: String,
    seen: Mutex<HashMap<String, DeploymentState>>,
}

impl DeploymentProgressDisplay {
    pub fn new(api: Arc<dyn DevCenterApi>, console: Arc<dyn Console>, deployment_id: impl Into<String>) -> Self {
        Self {
            api,
            console,
            deployment_id: deployment_id.into(),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record the state of an operation; false if it was already reported
    fn mark_seen(&self, operation_id: &str, state: DeploymentState) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.insert(operation_id.to_string(), state) != Some(state)
    }
}

fn progress_line(operation: &DeploymentOperation, state: DeploymentState) -> Option<String> {
    let target = operation.properties.target_resource.as_ref()?;
    let resource = format!(
        "{} {}",
        target.resource_type,
        with_highlight_format(&target.resource_name)
    );
    let duration = operation
        .properties
        .duration
        .as_deref()
        .and_then(parse_iso8601_duration)
        .map(|d| with_gray_format(&format!("({})", format_duration(d))))
        .unwrap_or_default();

    match state {
        DeploymentState::Running => Some(format!("  Creating: {}", resource)),
        DeploymentState::Succeeded => Some(format!("  Done: {} {}", resource, duration)),
        DeploymentState::Failed => Some(format!("  Failed: {} {}", resource, duration)),
        DeploymentState::Other => None,
    }
}

#[async_trait]
impl ProgressReporter for DeploymentProgressDisplay {
    async fn report_since(&self, cursor: ProgressCursor) -> Result<ProgressCursor, ProvisionError> {
        let mut operations: Vec<DeploymentOperation> = self
            .api
            .list_deployment_operations(&self.deployment_id)
            .await?
            .into_iter()
            .filter(|op| op.properties.timestamp > cursor.at())
            .filter(|op| op.properties.target_resource.is_some())
            .collect();
        operations.sort_by_key(|op| op.properties.timestamp);

        let mut next = cursor;
        for operation in &operations {
            next.advance(ProgressCursor::new(operation.properties.timestamp));

            let state = deployment_state(&operation.properties.provisioning_state);
            if !self.mark_seen(&operation.operation_id, state) {
                continue;
            }
            if let Some(line) = progress_line(operation, state) {
                self.console.message(&line);
            }
        }

        Ok(next)
    }
}

/// Builds progress displays that print to a console
pub struct ConsoleProgressReporters {
    api: Arc<dyn DevCenterApi>,
    console: Arc<dyn Console>,
}

impl ConsoleProgressReporters {
    pub fn new(api: Arc<dyn DevCenterApi>, console: Arc<dyn Console>) -> Self {
        Self { api, console }
    }
}

impl ProgressReporterFactory for ConsoleProgressReporters {
    fn reporter(&self, deployment: &DeploymentHandle) -> Arc<dyn ProgressReporter> {
        Arc::new(DeploymentProgressDisplay::new(
            self.api.clone(),
            self.console.clone(),
            deployment.id.clone(),
        ))
    }
}
