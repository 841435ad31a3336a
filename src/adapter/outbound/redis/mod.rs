//! Redis dividend cache shared across processes.
//!
//! Entries are stored as JSON under `{prefix}:netuid:{n|all}:hotkey:{h|all}`
//! with a millisecond TTL. Reads also check the stored `expires_at`, so an
//! entry is never returned past its validity even if Redis expiry lags.
//!
//! A multiplexed connection does not recover once its socket dies, so any
//! I/O failure or timeout drops it and the next operation reconnects.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::{Dividends, QueryKey};
use crate::error::{Error, Result};
use crate::port::outbound::cache::{CacheEntry, CacheStore};

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "tao_dividend";

/// Keys fetched per SCAN round during purge.
const SCAN_BATCH: usize = 200;

fn unavailable(e: impl std::fmt::Display) -> Error {
    Error::CacheUnavailable(e.to_string())
}

/// Whether `e` means the connection itself is unusable.
fn is_connection_failure(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

/// Milliseconds Redis should keep `expires_at`, never more than `ttl`.
///
/// `None` when the entry is already expired.
fn expiry_ms(expires_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> Option<i64> {
    let remaining = (expires_at - now).num_milliseconds();
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let remaining = remaining.min(ttl_ms);
    (remaining > 0).then_some(remaining)
}

/// [`CacheStore`] on a Redis server.
///
/// The connection is opened on first use and shared (multiplexed) by every
/// caller. Each operation is bounded by `op_timeout`.
pub struct RedisCache {
    client: Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    prefix: String,
    op_timeout: Duration,
}

impl RedisCache {
    /// Create a cache for the server at `url`. Does not connect yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheUnavailable`] if `url` is not a valid Redis URL.
    pub fn new(url: &str, prefix: impl Into<String>, op_timeout: Duration) -> Result<Self> {
        let client = Client::open(url).map_err(unavailable)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            prefix: prefix.into(),
            op_timeout,
        })
    }

    /// Storage key for `key`.
    #[must_use]
    pub fn storage_key(&self, key: &QueryKey) -> String {
        format!("{}:{key}", self.prefix)
    }

    fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let cached = self.connection.lock().clone();
        if let Some(conn) = cached {
            return Ok(conn);
        }
        let conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        info!(prefix = %self.prefix, "Connected to Redis cache");
        *self.connection.lock() = Some(conn.clone());
        Ok(conn)
    }

    /// Drop the shared connection so the next operation reconnects.
    fn disconnect(&self, reason: &str) {
        if self.connection.lock().take().is_some() {
            warn!(prefix = %self.prefix, reason, "Dropping Redis connection");
        }
    }

    /// Run `op` on a shared connection within the operation timeout.
    async fn bounded<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: std::future::Future<Output = redis::RedisResult<T>>,
    {
        let work = async {
            let conn = self.connection().await?;
            op(conn).await.map_err(|e| {
                if is_connection_failure(&e) {
                    self.disconnect(&e.to_string());
                }
                unavailable(e)
            })
        };
        match timeout(self.op_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                self.disconnect("operation timed out");
                Err(Error::CacheUnavailable(format!(
                    "timed out after {:?}",
                    self.op_timeout
                )))
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &QueryKey) -> Result<Option<CacheEntry>> {
        let storage_key = self.storage_key(key);
        let raw: Option<String> = self
            .bounded(|mut conn| async move {
                redis::cmd("GET").arg(&storage_key).query_async(&mut conn).await
            })
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %key, error = %e, "Discarding unreadable cache entry");
                return Ok(None);
            }
        };
        if entry.expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn put(&self, key: &QueryKey, value: &Dividends, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value.clone(), ttl);
        let Some(remaining_ms) = expiry_ms(entry.expires_at, ttl, Utc::now()) else {
            return Ok(());
        };
        let payload = serde_json::to_string(&entry)?;
        let storage_key = self.storage_key(key);
        self.bounded(|mut conn| async move {
            redis::cmd("SET")
                .arg(&storage_key)
                .arg(payload)
                .arg("PX")
                .arg(remaining_ms)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn evict(&self, key: &QueryKey) -> Result<bool> {
        let storage_key = self.storage_key(key);
        let removed: usize = self
            .bounded(|mut conn| async move {
                redis::cmd("DEL").arg(&storage_key).query_async(&mut conn).await
            })
            .await?;
        Ok(removed > 0)
    }

    async fn purge(&self) -> Result<usize> {
        let pattern = format!("{}:*", self.prefix);
        self.bounded(|mut conn| async move {
            let mut cursor: u64 = 0;
            let mut removed = 0;
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await?;
                if !keys.is_empty() {
                    removed += redis::cmd("DEL")
                        .arg(&keys)
                        .query_async::<_, usize>(&mut conn)
                        .await?;
                }
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            Ok(removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_use_prefix_and_wildcards() {
        let cache = RedisCache::new("redis://127.0.0.1/", DEFAULT_PREFIX, Duration::from_secs(1)).unwrap();
        assert_eq!(
            cache.storage_key(&QueryKey::specific(18, "5FFA")),
            "tao_dividend:netuid:18:hotkey:5FFA"
        );
        assert_eq!(cache.storage_key(&QueryKey::all()), "tao_dividend:netuid:all:hotkey:all");
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            RedisCache::new("not-a-url", DEFAULT_PREFIX, Duration::from_secs(1)),
            Err(Error::CacheUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_reports_unavailable() {
        // Port 1 is reserved; connecting fails fast.
        let cache = RedisCache::new("redis://127.0.0.1:1/", DEFAULT_PREFIX, Duration::from_secs(2)).unwrap();
        let err = cache.get(&QueryKey::all()).await.unwrap_err();
        assert!(matches!(err, Error::CacheUnavailable(_)));
        // A failed connect is not kept; the next call dials again.
        assert!(!cache.is_connected());
        assert!(cache.get(&QueryKey::all()).await.is_err());
    }

    #[test]
    fn socket_failures_force_a_reconnect() {
        let reset = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        assert!(is_connection_failure(&reset));

        let refused = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(is_connection_failure(&refused));

        let wrong_type = RedisError::from((redis::ErrorKind::TypeError, "not a string"));
        assert!(!is_connection_failure(&wrong_type));
    }

    #[test]
    fn expiry_never_exceeds_ttl() {
        let now = Utc::now();
        let ttl = Duration::from_secs(60);

        assert_eq!(expiry_ms(now + chrono::Duration::seconds(30), ttl, now), Some(30_000));
        // Observed "in the future" by a skewed upstream clock.
        assert_eq!(expiry_ms(now + chrono::Duration::hours(1), ttl, now), Some(60_000));
        assert_eq!(expiry_ms(now - chrono::Duration::seconds(1), ttl, now), None);
        assert_eq!(expiry_ms(now, ttl, now), None);
    }

    #[cfg(feature = "integration-tests")]
    mod integration_tests {
        use super::*;
        use crate::domain::DividendRecord;

        #[tokio::test]
        #[ignore = "requires a Redis server at REDIS_URL"]
        async fn round_trips_against_live_server() {
            let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
            let cache = RedisCache::new(&url, "taodiv_test", Duration::from_secs(2)).unwrap();
            let key = QueryKey::specific(1, "hk");
            let value = Dividends::Single(DividendRecord::new(1, "hk", 9, Utc::now()));

            cache.put(&key, &value, Duration::from_secs(30)).await.unwrap();
            assert_eq!(cache.get(&key).await.unwrap().unwrap().value, value);
            assert!(cache.purge().await.unwrap() >= 1);
            assert!(cache.get(&key).await.unwrap().is_none());
        }

        #[tokio::test]
        #[ignore = "requires a Redis server at REDIS_URL"]
        async fn recovers_after_server_drops_connection() {
            let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
            let cache = RedisCache::new(&url, "taodiv_test", Duration::from_secs(2)).unwrap();
            let key = QueryKey::specific(2, "hk");
            assert!(cache.get(&key).await.is_ok());

            // Kill every normal client, our own included.
            let _ = cache
                .bounded(|mut conn| async move {
                    redis::cmd("CLIENT")
                        .arg("KILL")
                        .arg("TYPE")
                        .arg("normal")
                        .arg("SKIPME")
                        .arg("no")
                        .query_async::<_, i64>(&mut conn)
                        .await
                })
                .await;

            let mut recovered = false;
            for _ in 0..5 {
                if cache.get(&key).await.is_ok() {
                    recovered = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            assert!(recovered, "cache never reconnected");
        }
    }
}
