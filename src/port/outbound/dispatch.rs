//! Durable trade job queue port.

use async_trait::async_trait;

use crate::domain::{JobId, TradeJob};
use crate::error::Result;

/// Result of an accepted enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// The job is new and queued for delivery.
    Accepted,
    /// A job with the same id was already accepted; nothing was queued.
    Duplicate,
}

/// A job handed to one worker, leased until acknowledged or expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub job: TradeJob,
    /// 1 on first delivery, higher on redelivery.
    pub attempt: u32,
}

/// Queue between the query path and trade workers.
///
/// # Contract
///
/// - `enqueue` fails fast with [`Error::DispatchUnavailable`](crate::error::Error::DispatchUnavailable)
///   instead of blocking.
/// - Each accepted job is leased to one worker at a time and redelivered if
///   the lease expires before `ack`. Delivery is at-least-once; workers must
///   tolerate duplicates.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Return the backend name for logging.
    fn name(&self) -> &'static str;

    /// Accept `job` for delivery, deduplicating by `job_id`.
    async fn enqueue(&self, job: &TradeJob) -> Result<Enqueued>;

    /// Lease the next ready job, if any.
    async fn dequeue(&self) -> Result<Option<Delivery>>;

    /// Acknowledge a leased job so it is never redelivered.
    async fn ack(&self, job_id: &JobId) -> Result<()>;

    /// Number of jobs not yet acknowledged.
    async fn pending(&self) -> Result<usize>;
}
