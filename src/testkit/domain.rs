//! Builders for domain primitives used across tests.

use chrono::Utc;

use crate::domain::{DividendRecord, JobId, SubnetId, TradeJob};
use crate::port::outbound::dispatch::Delivery;

/// A record observed now.
pub fn record(subnet_id: SubnetId, account_id: &str, value: u64) -> DividendRecord {
    DividendRecord::new(subnet_id, account_id, value, Utc::now())
}

/// A job with an explicit id.
pub fn job(job_id: &str, subnet_id: SubnetId, account_id: &str) -> TradeJob {
    TradeJob {
        job_id: JobId::new(job_id),
        subnet_id,
        account_id: account_id.to_string(),
        requested_at: Utc::now(),
    }
}

/// First delivery of `job`.
pub fn delivery(job: TradeJob) -> Delivery {
    Delivery { job, attempt: 1 }
}

/// A later delivery of the same job, as after a crash.
pub fn redelivery(job: TradeJob, attempt: u32) -> Delivery {
    Delivery { job, attempt }
}
