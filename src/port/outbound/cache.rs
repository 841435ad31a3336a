//! Time-bounded key/value cache port for dividend query results.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Dividends, QueryKey};
use crate::error::Result;

/// A cached query result and the wall-clock time it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Dividends,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry expiring `ttl` after the value was observed upstream.
    #[must_use]
    pub fn new(value: Dividends, ttl: Duration) -> Self {
        let observed_at = value.observed_at().unwrap_or_else(Utc::now);
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        Self {
            value,
            expires_at: observed_at + ttl,
        }
    }
}

/// Shared cache consulted before the upstream dividend source.
///
/// # Contract
///
/// - `get` never returns an expired entry; expiry may be lazy or active.
/// - Entries are replaced whole by `put`, never partially updated.
/// - Every failure is reported as [`Error::CacheUnavailable`](crate::error::Error::CacheUnavailable);
///   callers treat it as a miss.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`); the query path calls
/// them from many tasks at once.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Return the backend name for logging.
    fn name(&self) -> &'static str;

    /// Look up a valid entry for `key`.
    async fn get(&self, key: &QueryKey) -> Result<Option<CacheEntry>>;

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    async fn put(&self, key: &QueryKey, value: &Dividends, ttl: Duration) -> Result<()>;

    /// Remove the entry for `key`. Returns whether one existed.
    async fn evict(&self, key: &QueryKey) -> Result<bool>;

    /// Remove every dividend entry. Returns the number removed.
    async fn purge(&self) -> Result<usize>;
}
