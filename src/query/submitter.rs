//! Query submission with transient-error retries.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::retry::{self, RetryPolicy, RetryState};
use crate::service::{ExecutionHandle, ExecutionRequest, ExecutionService};

/// Issues execution requests, retrying transient failures.
pub struct QuerySubmitter<'a> {
    service: &'a dyn ExecutionService,
    policy: RetryPolicy,
}

impl<'a> QuerySubmitter<'a> {
    pub fn new(service: &'a dyn ExecutionService, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Submits a request and returns its execution handle.
    ///
    /// Transient errors are retried after the policy delay; any other error
    /// fails with `FatalSubmission` carrying the service error unchanged.
    pub async fn submit(&self, request: &ExecutionRequest) -> Result<ExecutionHandle> {
        self.submit_with_cancel(request, None).await
    }

    /// Like [`submit`](Self::submit), but stops waiting once `cancel` fires.
    pub async fn submit_with_cancel(
        &self,
        request: &ExecutionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<ExecutionHandle> {
        let mut retry = RetryState::new(self.policy);

        loop {
            retry::check_cancelled(cancel)?;
            debug!(
                "Submitting statement to {}.{} (attempt {})",
                request.catalog(),
                request.database(),
                retry.failures() + 1
            );

            match self.service.start_execution(request).await {
                Ok(handle) => {
                    info!("Submitted query {}", handle);
                    return Ok(handle);
                }
                Err(e) if e.is_transient() => {
                    if !retry.record_failure() {
                        return Err(RelayError::RetriesExhausted {
                            attempts: retry.failures(),
                            source: e,
                        });
                    }
                    warn!(
                        "Submission failed (attempt {}), retrying in {:?}: {}",
                        retry.failures(),
                        self.policy.delay(),
                        e
                    );
                    retry::pause(self.policy.delay(), cancel).await?;
                }
                Err(e) => return Err(RelayError::FatalSubmission(e)),
            }
        }
    }
}
