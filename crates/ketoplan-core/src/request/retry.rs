//! Capped retry policy for provider calls.
//!
//! Every attempt is a billed call, so the policy never allows more than
//! [`MAX_ATTEMPTS_CAP`] attempts and only retries errors that
//! [`RequestError::is_transient`] classifies as worth another try.

use std::future::Future;
use std::time::Duration;

use super::RequestError;

/// Hard upper bound on attempts per request, including the first.
pub const MAX_ATTEMPTS_CAP: u32 = 2;

/// How many times to try a request and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Default wait between attempts.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

    /// A single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Build a policy. `max_attempts` is clamped to `1..=MAX_ATTEMPTS_CAP`.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_CAP),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Whether a failure on 1-based `attempt` should be retried.
    pub fn should_retry(&self, attempt: u32, err: &RequestError) -> bool {
        attempt < self.max_attempts && err.is_transient()
    }

    /// Run `op` under this policy. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RequestError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(attempt, &err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = self.backoff.as_millis() as u64,
                        error = %err,
                        "transient provider error, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
