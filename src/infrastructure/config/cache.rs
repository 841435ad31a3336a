//! Dividend cache configuration.

use std::time::Duration;

use serde::Deserialize;

/// Which cache implementation to build.
///
/// Defaults to Redis when it is compiled in, since a one-shot CLI process
/// gains nothing from a private cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map, private to this process.
    #[cfg_attr(not(feature = "redis"), default)]
    Memory,
    /// Shared Redis server.
    #[cfg_attr(feature = "redis", default)]
    Redis,
}

/// Dividend cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Validity of a cached result, counted from its observation time.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Redis server URL. `REDIS_URL` overrides it.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix for every Redis key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Bound on one cache operation (milliseconds).
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    #[must_use]
    pub const fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_secs: default_ttl_secs(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

const fn default_ttl_secs() -> u64 {
    120
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".into()
}

fn default_key_prefix() -> String {
    "tao_dividend".into()
}

const fn default_op_timeout_ms() -> u64 {
    250
}
