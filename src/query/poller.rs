//! Execution status polling.
//!
//! Drives a submitted query from SUBMITTED to one of the terminal states
//! SUCCEEDED, FAILED or CANCELLED by checking its status on a fixed interval.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::retry::{self, RetryPolicy, RetryState};
use crate::service::{ExecutionDetails, ExecutionHandle, ExecutionService, QueryState};

/// Polls an execution until it reaches a terminal state.
pub struct ExecutionPoller<'a> {
    service: &'a dyn ExecutionService,
    policy: RetryPolicy,
}

impl<'a> ExecutionPoller<'a> {
    pub fn new(service: &'a dyn ExecutionService, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Waits for the execution to finish.
    ///
    /// Resolves with the execution details on SUCCEEDED and fails with
    /// `QueryFailed` on FAILED or CANCELLED. A transient status-check error
    /// delays the next check by the policy delay instead of `poll_interval`.
    pub async fn await_completion(
        &self,
        handle: &ExecutionHandle,
        poll_interval: Duration,
    ) -> Result<ExecutionDetails> {
        self.await_completion_with_cancel(handle, poll_interval, None)
            .await
    }

    /// Like [`await_completion`](Self::await_completion), but stops waiting once `cancel` fires.
    ///
    /// Cancelling only abandons the wait; the remote query keeps running.
    pub async fn await_completion_with_cancel(
        &self,
        handle: &ExecutionHandle,
        poll_interval: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<ExecutionDetails> {
        let mut retry = RetryState::new(self.policy);
        let mut last_state: Option<QueryState> = None;

        loop {
            retry::check_cancelled(cancel)?;

            let wait = match self.service.get_status(handle).await {
                Ok(details) => {
                    retry.reset();
                    let state = details.state();
                    if last_state != Some(state) {
                        debug!("Query {} is {}", handle, state);
                        last_state = Some(state);
                    }

                    if state == QueryState::Succeeded {
                        info!("Query {} succeeded", handle);
                        return Ok(details);
                    }
                    if state.is_terminal() {
                        return Err(RelayError::query_failed(
                            state,
                            details.status.reason.as_deref(),
                        ));
                    }
                    poll_interval
                }
                Err(e) if e.is_transient() => {
                    if !retry.record_failure() {
                        return Err(RelayError::RetriesExhausted {
                            attempts: retry.failures(),
                            source: e,
                        });
                    }
                    warn!(
                        "Status check for {} failed, retrying in {:?}: {}",
                        handle,
                        self.policy.delay(),
                        e
                    );
                    self.policy.delay()
                }
                Err(e) => return Err(RelayError::Service(e)),
            };

            retry::pause(wait, cancel).await?;
        }
    }
}
