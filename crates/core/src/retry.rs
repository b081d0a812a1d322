//! Retry-with-backoff policy for calls to rate-limited external services.

use crate::{MatchError, MatchResult};
use std::future::Future;
use std::time::Duration;

/// Exponential backoff policy.
///
/// Attempt `n` (1-based) that fails with a retryable error is followed by a delay of
/// `initial_backoff * 2^(n-1)`, capped at `max_backoff`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Create a new `RetryPolicy`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInput`] if `max_attempts` is zero or
    /// `max_backoff < initial_backoff`.
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
    ) -> MatchResult<Self> {
        if max_attempts == 0 {
            return Err(MatchError::InvalidInput(
                "max_attempts must be at least 1".into(),
            ));
        }
        if max_backoff < initial_backoff {
            return Err(MatchError::InvalidInput(
                "max_backoff cannot be shorter than initial_backoff".into(),
            ));
        }

        Ok(Self {
            max_attempts,
            initial_backoff,
            max_backoff,
        })
    }

    /// A policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Delay after the failed attempt number `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the attempts are
    /// exhausted. `op` receives the 1-based attempt number.
    ///
    /// Returns the last error on failure.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_retryable(&err) => {
                    let delay = self.backoff_after(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(crate::constants::DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(crate::constants::DEFAULT_MAX_BACKOFF_MS),
        }
    }
}
