//! Durable SQLite trade job queue.
//!
//! A job is ready when it is `queued` and its `visible_at` has passed.
//! Dequeueing pushes `visible_at` forward by the visibility timeout inside an
//! immediate transaction, which is the lease: no other worker can see the
//! job until it expires. Acknowledged rows are kept so a re-enqueued id is
//! still recognised as a duplicate.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use super::database::connection::{format_timestamp, interact, parse_timestamp, DbPool};
use super::database::model::{NewTradeJobRow, TradeJobRow};
use super::database::schema::trade_jobs;
use crate::domain::{JobId, SubnetId, TradeJob};
use crate::error::{Error, Result};
use crate::port::outbound::dispatch::{Delivery, Enqueued, TaskDispatcher};

const QUEUED: &str = "queued";
const ACKED: &str = "acked";

fn unavailable(e: impl std::fmt::Display) -> Error {
    Error::DispatchUnavailable(e.to_string())
}

/// SQLite-backed [`TaskDispatcher`] with lease-based delivery.
pub struct SqliteDispatcher {
    pool: DbPool,
    visibility_timeout: Duration,
}

impl SqliteDispatcher {
    /// Create a dispatcher on an already migrated pool.
    #[must_use]
    pub fn new(pool: DbPool, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            visibility_timeout,
        }
    }

    fn delivery_from_row(row: TradeJobRow) -> Result<Delivery> {
        let subnet_id = SubnetId::try_from(row.subnet_id)
            .map_err(|_| Error::Parse(format!("subnet id {} out of range", row.subnet_id)))?;
        Ok(Delivery {
            job: TradeJob {
                job_id: JobId::from(row.job_id),
                subnet_id,
                account_id: row.account_id,
                requested_at: parse_timestamp(&row.requested_at)?,
            },
            attempt: u32::try_from(row.attempts + 1).unwrap_or(1),
        })
    }
}

#[async_trait]
impl TaskDispatcher for SqliteDispatcher {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn enqueue(&self, job: &TradeJob) -> Result<Enqueued> {
        let row = NewTradeJobRow {
            job_id: job.job_id.to_string(),
            subnet_id: i32::from(job.subnet_id),
            account_id: job.account_id.clone(),
            requested_at: format_timestamp(job.requested_at),
            state: QUEUED.to_string(),
            attempts: 0,
            visible_at: format_timestamp(Utc::now()),
        };
        interact(&self.pool, move |conn| {
            let inserted = diesel::insert_or_ignore_into(trade_jobs::table)
                .values(&row)
                .execute(conn)
                .map_err(unavailable)?;
            Ok(if inserted == 0 {
                Enqueued::Duplicate
            } else {
                Enqueued::Accepted
            })
        })
        .await
        .map_err(|e| match e {
            Error::DispatchUnavailable(_) => e,
            other => unavailable(other),
        })
    }

    async fn dequeue(&self) -> Result<Option<Delivery>> {
        let lease = chrono::Duration::from_std(self.visibility_timeout)
            .map_err(|e| Error::DispatchUnavailable(format!("visibility timeout: {e}")))?;
        let row = interact(&self.pool, move |conn| {
            conn.immediate_transaction(|conn| {
                let now = Utc::now();
                let row = trade_jobs::table
                    .filter(trade_jobs::state.eq(QUEUED))
                    .filter(trade_jobs::visible_at.le(format_timestamp(now)))
                    .order((trade_jobs::visible_at.asc(), trade_jobs::id.asc()))
                    .select(TradeJobRow::as_select())
                    .first::<TradeJobRow>(conn)
                    .optional()?;
                let Some(row) = row else {
                    return Ok(None);
                };

                diesel::update(trade_jobs::table.filter(trade_jobs::job_id.eq(&row.job_id)))
                    .set((
                        trade_jobs::attempts.eq(trade_jobs::attempts + 1),
                        trade_jobs::visible_at.eq(format_timestamp(now + lease)),
                    ))
                    .execute(conn)?;
                Ok(Some(row))
            })
            .map_err(|e: diesel::result::Error| unavailable(e))
        })
        .await?;
        row.map(Self::delivery_from_row).transpose()
    }

    async fn ack(&self, job_id: &JobId) -> Result<()> {
        let id = job_id.to_string();
        interact(&self.pool, move |conn| {
            diesel::update(trade_jobs::table.filter(trade_jobs::job_id.eq(id)))
                .set(trade_jobs::state.eq(ACKED))
                .execute(conn)
                .map_err(unavailable)?;
            Ok(())
        })
        .await
    }

    async fn pending(&self) -> Result<usize> {
        interact(&self.pool, |conn| {
            let count: i64 = trade_jobs::table
                .filter(trade_jobs::state.eq(QUEUED))
                .count()
                .get_result(conn)
                .map_err(unavailable)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};

    fn dispatcher(visibility: Duration) -> (tempfile::TempDir, SqliteDispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");
        let pool = create_pool(path.to_str().unwrap(), 4, Duration::from_secs(1)).unwrap();
        run_migrations(&pool).unwrap();
        (dir, SqliteDispatcher::new(pool, visibility))
    }

    fn job(id: &str) -> TradeJob {
        TradeJob {
            job_id: JobId::new(id),
            subnet_id: 18,
            account_id: "hk".into(),
            requested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicates_are_detected_before_and_after_ack() {
        let (_dir, queue) = dispatcher(Duration::from_secs(30));
        assert_eq!(queue.enqueue(&job("a")).await.unwrap(), Enqueued::Accepted);
        assert_eq!(queue.enqueue(&job("a")).await.unwrap(), Enqueued::Duplicate);

        let delivery = queue.dequeue().await.unwrap().unwrap();
        queue.ack(&delivery.job.job_id).await.unwrap();
        assert_eq!(queue.enqueue(&job("a")).await.unwrap(), Enqueued::Duplicate);
        assert_eq!(queue.pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn leased_job_is_hidden_from_other_consumers() {
        let (_dir, queue) = dispatcher(Duration::from_secs(30));
        queue.enqueue(&job("a")).await.unwrap();

        let first = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(first.attempt, 1);
        assert_eq!(first.job.subnet_id, 18);
        assert!(queue.dequeue().await.unwrap().is_none());
        assert_eq!(queue.pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn expired_lease_is_redelivered() {
        let (_dir, queue) = dispatcher(Duration::ZERO);
        queue.enqueue(&job("a")).await.unwrap();

        assert_eq!(queue.dequeue().await.unwrap().unwrap().attempt, 1);
        let again = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(again.job.job_id, JobId::new("a"));
        assert_eq!(again.attempt, 2);
    }

    #[tokio::test]
    async fn jobs_are_delivered_in_enqueue_order() {
        let (_dir, queue) = dispatcher(Duration::from_secs(30));
        for id in ["a", "b", "c"] {
            queue.enqueue(&job(id)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        for id in ["a", "b", "c"] {
            let delivery = queue.dequeue().await.unwrap().unwrap();
            assert_eq!(delivery.job.job_id, JobId::new(id));
        }
    }

    #[tokio::test]
    async fn concurrent_consumers_never_share_a_job() {
        let (_dir, queue) = dispatcher(Duration::from_secs(30));
        let queue = std::sync::Arc::new(queue);
        for i in 0..20 {
            queue.enqueue(&job(&format!("job-{i}"))).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = std::sync::Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(delivery) = queue.dequeue().await.unwrap() {
                    seen.push(delivery.job.job_id);
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        assert_eq!(all.len(), 20);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 20);
    }
}
