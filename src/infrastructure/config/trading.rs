//! Trade sizing, dispatch and worker configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::retry::RetryPolicy;
use crate::application::trade::WorkerSettings;

/// Trade sizing and execution.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// TAO staked or unstaked per sentiment point. Defaults to 0.01.
    #[serde(default = "default_unit_amount")]
    pub unit_amount: Decimal,

    /// Requests for the same subnet and account inside one window share a
    /// job id, so only the first is queued.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Log trades instead of submitting them.
    #[serde(default)]
    pub dry_run: bool,

    /// Bound on one executor call (milliseconds).
    #[serde(default = "default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,
}

impl TradingConfig {
    #[must_use]
    pub const fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }

    #[must_use]
    pub const fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            unit_amount: default_unit_amount(),
            dedup_window_secs: default_dedup_window_secs(),
            dry_run: false,
            execution_timeout_ms: default_execution_timeout_ms(),
        }
    }
}

/// Which job queue to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherBackend {
    /// Durable queue in the SQLite database, shared across processes.
    #[default]
    Sqlite,
    /// In-process queue; jobs are lost on exit.
    Memory,
}

/// Job queue settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub backend: DispatcherBackend,

    /// How long a dequeued job stays hidden from other workers. Must exceed
    /// the worst-case duration of one job.
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Bound on one enqueue from the query path (milliseconds).
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,

    /// Queue bound for the memory backend.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl DispatcherConfig {
    #[must_use]
    pub const fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    #[must_use]
    pub const fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            backend: DispatcherBackend::default(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
            capacity: default_capacity(),
        }
    }
}

/// Backoff for one kind of external call.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempt ceiling, including the first try.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl RetryConfig {
    const fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }

    /// Build the retry policy, optionally bounding each attempt.
    #[must_use]
    pub fn policy(&self, attempt_timeout: Option<Duration>) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            attempt_timeout,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_attempts(default_max_attempts())
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Jobs processed at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Idle wait when the queue is empty (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub scoring_retry: RetryConfig,

    /// Defaults to 2 attempts.
    #[serde(default = "default_execution_retry")]
    pub execution_retry: RetryConfig,

    /// Retries for history reads and outcome writes.
    #[serde(default)]
    pub record_retry: RetryConfig,
}

impl WorkerConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Worker settings with each attempt bounded by the matching timeout.
    ///
    /// An execution intent counts as live for as long as a delivery can
    /// spend executing and then writing its outcome.
    #[must_use]
    pub fn settings(
        &self,
        unit_amount: Decimal,
        scoring_timeout: Duration,
        execution_timeout: Duration,
        record_timeout: Duration,
    ) -> WorkerSettings {
        let mut settings = WorkerSettings {
            unit_amount,
            scoring: self.scoring_retry.policy(Some(scoring_timeout)),
            execution: self.execution_retry.policy(Some(execution_timeout)),
            record: self.record_retry.policy(Some(record_timeout)),
            ..WorkerSettings::default()
        };
        if let Some(window) = settings.execution_window() {
            settings.intent_timeout = window;
        }
        settings
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            scoring_retry: RetryConfig::default(),
            execution_retry: default_execution_retry(),
            record_retry: RetryConfig::default(),
        }
    }
}

fn default_unit_amount() -> Decimal {
    Decimal::new(1, 2)
}

const fn default_dedup_window_secs() -> u64 {
    60
}

const fn default_execution_timeout_ms() -> u64 {
    30_000
}

const fn default_visibility_timeout_secs() -> u64 {
    600
}

const fn default_enqueue_timeout_ms() -> u64 {
    500
}

const fn default_capacity() -> usize {
    10_000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    1_000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_execution_retry() -> RetryConfig {
    RetryConfig::with_attempts(2)
}

const fn default_concurrency() -> usize {
    4
}

const fn default_poll_interval_ms() -> u64 {
    500
}
