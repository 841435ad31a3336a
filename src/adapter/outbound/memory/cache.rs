//! In-process dividend cache.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::domain::{Dividends, QueryKey};
use crate::error::Result;
use crate::port::outbound::cache::{CacheEntry, CacheStore};

struct Stored {
    entry: CacheEntry,
    /// Monotonic equivalent of `entry.expires_at`.
    deadline: Instant,
}

/// Cache held in process memory, expired lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<QueryKey, Stored>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &QueryKey) -> Result<Option<CacheEntry>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(stored) if now < stored.deadline => return Ok(Some(stored.entry.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|s| s.deadline <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &QueryKey, value: &Dividends, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value.clone(), ttl);
        let remaining = (entry.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(ttl);
        let stored = Stored {
            entry,
            deadline: Instant::now() + remaining,
        };
        self.entries.write().insert(key.clone(), stored);
        Ok(())
    }

    async fn evict(&self, key: &QueryKey) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn purge(&self) -> Result<usize> {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}
