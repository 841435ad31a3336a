//! Append-only history port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{DividendRecord, JobId, QueryKey, TradeOutcome};
use crate::error::Result;

/// One atomic append to the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRecord {
    /// Fresh upstream observations from one query.
    Dividends(Vec<DividendRecord>),
    /// The terminal record for a trade job.
    Outcome(TradeOutcome),
}

/// Whether an append changed the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    Written,
    /// An outcome for the same `job_id` already exists; nothing was written.
    AlreadyRecorded,
}

/// Result of journalling an execution intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionIntent {
    /// This delivery owns the intent and may call the executor.
    Began,
    /// A delivery already journalled execution of the job.
    Held {
        /// Delivery attempt that owns the intent.
        attempt: u32,
        started_at: DateTime<Utc>,
    },
}

/// Append-only record of dividend observations and trade outcomes.
///
/// Each append is atomic: concurrent writers never interleave partial
/// records, and at most one outcome is ever stored per `job_id`.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a record.
    async fn append(&self, record: &HistoryRecord) -> Result<Appended>;

    /// The recorded outcome for `job_id`, if any.
    async fn outcome(&self, job_id: &JobId) -> Result<Option<TradeOutcome>>;

    /// Whether an outcome exists for `job_id`.
    async fn exists_outcome(&self, job_id: &JobId) -> Result<bool> {
        Ok(self.outcome(job_id).await?.is_some())
    }

    /// Journal that delivery `attempt` is about to execute `job_id`.
    ///
    /// Returns the existing intent untouched if another delivery already
    /// reached this point; that delivery may still be running or may have
    /// traded and died before recording.
    async fn begin_execution(&self, job_id: &JobId, attempt: u32) -> Result<ExecutionIntent>;

    /// Most recent outcomes, newest first.
    async fn recent_outcomes(&self, limit: usize) -> Result<Vec<TradeOutcome>>;

    /// Most recent observations inside `key`'s scope, newest first.
    async fn recent_dividends(&self, key: &QueryKey, limit: usize) -> Result<Vec<DividendRecord>>;
}
