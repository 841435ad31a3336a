//! Deterministic trade job construction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{JobId, SubnetId, TradeJob};

/// Namespace for v5 job ids.
const JOB_NAMESPACE: Uuid = Uuid::from_u128(0x6a0f_3d52_9c1e_4b7a_8e25_d4c1_70b3_9f11);

/// Builds trade jobs whose ids are stable for one logical request per window.
///
/// Two requests for the same subnet and account inside the same
/// `dedup_window` produce the same [`JobId`], so the dispatcher can drop the
/// second as a duplicate.
#[derive(Debug, Clone)]
pub struct JobFactory {
    default_subnet: SubnetId,
    default_account: String,
    dedup_window: Duration,
}

impl JobFactory {
    pub fn new(
        default_subnet: SubnetId,
        default_account: impl Into<String>,
        dedup_window: Duration,
    ) -> Self {
        Self {
            default_subnet,
            default_account: default_account.into(),
            dedup_window,
        }
    }

    /// Build a job, resolving wildcard parts to the configured defaults.
    #[must_use]
    pub fn create(
        &self,
        subnet_id: Option<SubnetId>,
        account_id: Option<&str>,
        requested_at: DateTime<Utc>,
    ) -> TradeJob {
        let subnet_id = subnet_id.unwrap_or(self.default_subnet);
        let account_id = account_id.unwrap_or(&self.default_account).to_string();
        TradeJob {
            job_id: self.job_id(subnet_id, &account_id, requested_at),
            subnet_id,
            account_id,
            requested_at,
        }
    }

    fn job_id(&self, subnet_id: SubnetId, account_id: &str, at: DateTime<Utc>) -> JobId {
        let window = i64::try_from(self.dedup_window.as_secs())
            .unwrap_or(i64::MAX)
            .max(1);
        let bucket = at.timestamp().div_euclid(window);
        let name = format!("{subnet_id}:{account_id}:{bucket}");
        JobId::new(Uuid::new_v5(&JOB_NAMESPACE, name.as_bytes()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn factory() -> JobFactory {
        JobFactory::new(18, "default-hk", Duration::from_secs(60))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn same_window_yields_same_id() {
        let f = factory();
        let a = f.create(Some(3), Some("hk"), at(120));
        let b = f.create(Some(3), Some("hk"), at(179));
        assert_eq!(a.job_id, b.job_id);
    }

    #[test]
    fn next_window_yields_new_id() {
        let f = factory();
        let a = f.create(Some(3), Some("hk"), at(179));
        let b = f.create(Some(3), Some("hk"), at(180));
        assert_ne!(a.job_id, b.job_id);
    }

    #[test]
    fn different_targets_yield_different_ids() {
        let f = factory();
        let a = f.create(Some(3), Some("hk"), at(0));
        assert_ne!(a.job_id, f.create(Some(4), Some("hk"), at(0)).job_id);
        assert_ne!(a.job_id, f.create(Some(3), Some("other"), at(0)).job_id);
    }

    #[test]
    fn wildcards_resolve_to_defaults() {
        let f = factory();
        let job = f.create(None, None, at(0));
        assert_eq!(job.subnet_id, 18);
        assert_eq!(job.account_id, "default-hk");
        assert_eq!(job.job_id, f.create(Some(18), Some("default-hk"), at(30)).job_id);
    }

    #[test]
    fn zero_window_still_buckets() {
        let f = JobFactory::new(1, "hk", Duration::ZERO);
        let a = f.create(None, None, at(10));
        let b = f.create(None, None, at(10));
        let c = f.create(None, None, at(11));
        assert_eq!(a.job_id, b.job_id);
        assert_ne!(a.job_id, c.job_id);
    }
}
