//! Dividend observations returned by the upstream chain query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{QueryKey, SubnetId};

/// One dividend value for a subnet/account pair at a point in time.
///
/// Immutable once produced by an upstream source. Values are in rao.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub subnet_id: SubnetId,
    pub account_id: String,
    pub value: u64,
    pub observed_at: DateTime<Utc>,
}

impl DividendRecord {
    pub fn new(
        subnet_id: SubnetId,
        account_id: impl Into<String>,
        value: u64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subnet_id,
            account_id: account_id.into(),
            value,
            observed_at,
        }
    }

    /// Whether this record falls inside the scope described by `key`.
    #[must_use]
    pub fn within(&self, key: &QueryKey) -> bool {
        key.subnet_id().map_or(true, |id| id == self.subnet_id)
            && key.account_id().map_or(true, |a| a == self.account_id)
    }
}

/// Result of a dividend query: one record for a fully specified key, a list
/// for wildcard keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dividends {
    Single(DividendRecord),
    Aggregate(Vec<DividendRecord>),
}

impl Dividends {
    /// Records in this result, in upstream order.
    #[must_use]
    pub fn records(&self) -> &[DividendRecord] {
        match self {
            Self::Single(record) => std::slice::from_ref(record),
            Self::Aggregate(records) => records,
        }
    }

    /// Earliest observation time, used to anchor the cache expiry.
    #[must_use]
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.records().iter().map(|r| r.observed_at).min()
    }

    /// Check the result has the shape `key` asks for.
    ///
    /// A specific key needs exactly that record; an aggregate key needs a
    /// list whose records all fall inside the wildcard scope.
    pub fn validate_for(&self, key: &QueryKey) -> Result<(), String> {
        match (self, key.is_aggregate()) {
            (Self::Single(record), false) if record.within(key) => Ok(()),
            (Self::Single(record), false) => Err(format!(
                "record for netuid {} hotkey {} does not match {key}",
                record.subnet_id, record.account_id
            )),
            (Self::Single(_), true) => Err(format!("expected a list for {key}")),
            (Self::Aggregate(_), false) => Err(format!("expected a single record for {key}")),
            (Self::Aggregate(records), true) => match records.iter().find(|r| !r.within(key)) {
                Some(stray) => Err(format!(
                    "record for netuid {} hotkey {} is outside {key}",
                    stray.subnet_id, stray.account_id
                )),
                None => Ok(()),
            },
        }
    }
}
