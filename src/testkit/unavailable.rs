//! Adapters whose backing service is down.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DividendRecord, Dividends, JobId, QueryKey, TradeJob, TradeOutcome};
use crate::error::{Error, Result};
use crate::port::outbound::cache::{CacheEntry, CacheStore};
use crate::port::outbound::dispatch::{Delivery, Enqueued, TaskDispatcher};
use crate::port::outbound::history::{Appended, ExecutionIntent, HistoryRecord, HistoryStore};

/// Cache whose every operation reports unavailability.
#[derive(Debug, Default)]
pub struct UnavailableCache;

#[async_trait]
impl CacheStore for UnavailableCache {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn get(&self, _key: &QueryKey) -> Result<Option<CacheEntry>> {
        Err(Error::CacheUnavailable("connection refused".into()))
    }

    async fn put(&self, _key: &QueryKey, _value: &Dividends, _ttl: Duration) -> Result<()> {
        Err(Error::CacheUnavailable("connection refused".into()))
    }

    async fn evict(&self, _key: &QueryKey) -> Result<bool> {
        Err(Error::CacheUnavailable("connection refused".into()))
    }

    async fn purge(&self) -> Result<usize> {
        Err(Error::CacheUnavailable("connection refused".into()))
    }
}

/// Dispatcher that refuses every job, or never answers at all.
#[derive(Debug, Default)]
pub struct UnavailableDispatcher {
    hang: bool,
}

impl UnavailableDispatcher {
    pub fn new() -> Self {
        Self { hang: false }
    }

    /// Calls never complete; callers must bound them with a timeout.
    pub fn hanging() -> Self {
        Self { hang: true }
    }

    async fn fail<T>(&self) -> Result<T> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(Error::DispatchUnavailable("broker unreachable".into()))
    }
}

#[async_trait]
impl TaskDispatcher for UnavailableDispatcher {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn enqueue(&self, _job: &TradeJob) -> Result<Enqueued> {
        self.fail().await
    }

    async fn dequeue(&self) -> Result<Option<Delivery>> {
        self.fail().await
    }

    async fn ack(&self, _job_id: &JobId) -> Result<()> {
        self.fail().await
    }

    async fn pending(&self) -> Result<usize> {
        self.fail().await
    }
}

/// History store that cannot be reached, or never answers at all.
#[derive(Debug, Default)]
pub struct UnavailableHistory {
    hang: bool,
}

impl UnavailableHistory {
    pub fn new() -> Self {
        Self { hang: false }
    }

    /// Calls never complete.
    pub fn hanging() -> Self {
        Self { hang: true }
    }

    async fn fail<T>(&self) -> Result<T> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(Error::Database("database is locked".into()))
    }
}

#[async_trait]
impl HistoryStore for UnavailableHistory {
    async fn append(&self, _record: &HistoryRecord) -> Result<Appended> {
        self.fail().await
    }

    async fn outcome(&self, _job_id: &JobId) -> Result<Option<TradeOutcome>> {
        self.fail().await
    }

    async fn begin_execution(&self, _job_id: &JobId, _attempt: u32) -> Result<ExecutionIntent> {
        self.fail().await
    }

    async fn recent_outcomes(&self, _limit: usize) -> Result<Vec<TradeOutcome>> {
        self.fail().await
    }

    async fn recent_dividends(&self, _key: &QueryKey, _limit: usize) -> Result<Vec<DividendRecord>> {
        self.fail().await
    }
}
