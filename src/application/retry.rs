//! Bounded retries with exponential backoff and per-attempt timeouts.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::{Error, Result};

/// How many times to try an operation and how long to wait between tries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempt ceiling, including the first try. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Bound on each individual attempt. Exceeding it is a retryable failure.
    pub attempt_timeout: Option<Duration>,
}

/// Failure after the policy gave up.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: Error,
}

impl RetryPolicy {
    /// A policy that tries once and never sleeps.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            attempt_timeout: None,
        }
    }

    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = Some(attempt_timeout);
        self
    }

    /// Base delay before retry number `retry` (1-based), before jitter.
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Longest [`run`](Self::run) can take: every attempt hitting its timeout
    /// plus every backoff at full jitter. `None` when attempts are unbounded.
    #[must_use]
    pub fn worst_case(&self) -> Option<Duration> {
        let limit = self.attempt_timeout?;
        let attempts = self.max_attempts.max(1);
        let backoff: Duration = (1..attempts)
            .map(|retry| {
                let base = self.base_delay(retry);
                base + base / 5
            })
            .sum();
        Some(limit * attempts + backoff)
    }

    /// Base delay plus up to 20% random jitter.
    fn delay(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        let jitter_range_ms = (base.as_millis() as u64) / 5;
        if jitter_range_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_range_ms))
    }

    /// Run `op` until it succeeds, fails permanently, or the ceiling is hit.
    ///
    /// `op` receives the 1-based attempt number. Errors that are not
    /// [retryable](Error::is_retryable) stop immediately.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut op: F,
    ) -> std::result::Result<T, Exhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match self.attempt_timeout {
                Some(limit) => match timeout(limit, op(attempt)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::UpstreamTimeout(limit)),
                },
                None => op(attempt).await,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts || !error.is_retryable() {
                return Err(Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.delay(attempt);
            debug!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after delay"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            attempt_timeout: None,
        }
    }
}
