//! Long-running operation polling

use std::sync::Arc;
use std::time::Duration;

use devcenter_api::models::OperationState;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::errors::ProvisionError;
use crate::http::api::DevCenterApi;
use crate::http::client::LroResponse;

/// Follows an `Operation-Location` until the operation finishes
pub struct OperationPoller {
    api: Arc<dyn DevCenterApi>,
    location: Option<Url>,
    interval: Duration,
}

impl OperationPoller {
    pub fn new(api: Arc<dyn DevCenterApi>, response: LroResponse, interval: Duration) -> Self {
        Self {
            api,
            location: response.operation_location,
            interval,
        }
    }

    /// Wait for the operation to reach a terminal state.
    ///
    /// Errors with [`ProvisionError::Cancelled`] if `scope` fires first.
    pub async fn poll_until_done(&self, scope: &CancellationToken) -> Result<(), ProvisionError> {
        let Some(location) = &self.location else {
            debug!("No operation location, treating operation as complete");
            return Ok(());
        };

        loop {
            let status = tokio::select! {
                biased;
                _ = scope.cancelled() => return Err(ProvisionError::Cancelled),
                status = self.api.get_operation_status(location) => status?,
            };

            debug!("Operation {} is {:?}", location, status.status);
            match status.status {
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed | OperationState::Canceled => {
                    let message = status
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| format!("operation ended as {:?}", status.status));
                    return Err(ProvisionError::OperationFailed(message));
                }
                _ => {}
            }

            tokio::select! {
                biased;
                _ = scope.cancelled() => return Err(ProvisionError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
