//! Retry policy for transient service errors.
//!
//! Submission and status polling retry transient errors after a fixed delay.
//! By default retries are unbounded; callers can cap them by attempt count,
//! by elapsed time, or both.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{RelayError, Result};

/// Delay before retrying after a transient error.
pub const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Limits applied to retries of transient errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
    max_attempts: Option<u32>,
    max_elapsed: Option<Duration>,
}

impl RetryPolicy {
    /// Retries forever with the standard delay.
    pub fn unbounded() -> Self {
        Self {
            delay: TRANSIENT_RETRY_DELAY,
            max_attempts: None,
            max_elapsed: None,
        }
    }

    /// Caps the number of calls made, including the first one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Stops retrying once this much time has passed since the first failure.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.max_elapsed.is_none()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Tracks one run of consecutive transient failures against a policy.
#[derive(Debug)]
pub(crate) struct RetryState {
    policy: RetryPolicy,
    failures: u32,
    first_failure: Option<Instant>,
}

impl RetryState {
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            failures: 0,
            first_failure: None,
        }
    }

    /// Records a transient failure and returns whether another attempt is allowed.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.failures += 1;
        let first_failure = *self.first_failure.get_or_insert_with(Instant::now);

        if let Some(max_attempts) = self.policy.max_attempts {
            if self.failures >= max_attempts {
                return false;
            }
        }

        if let Some(max_elapsed) = self.policy.max_elapsed {
            if first_failure.elapsed() + self.policy.delay > max_elapsed {
                return false;
            }
        }

        true
    }

    /// Clears the failure run after a successful call.
    pub(crate) fn reset(&mut self) {
        self.failures = 0;
        self.first_failure = None;
    }

    /// Number of failed calls in the current run.
    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }
}

/// Sleeps for `delay`, returning early with `Cancelled` if the token fires.
pub(crate) async fn pause(delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(RelayError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

/// Fails with `Cancelled` if the token has already fired.
pub(crate) fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(RelayError::Cancelled),
        _ => Ok(()),
    }
}
