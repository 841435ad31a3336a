//! Dividend query use case consumed by the transport layer and the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Dividends, QueryKey, SubnetId};
use crate::error::Result;

/// A validated inbound dividend request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// `None` queries every subnet.
    #[serde(default)]
    pub subnet_id: Option<SubnetId>,

    /// `None` queries every account in scope.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Whether to enqueue a sentiment-driven trade after answering.
    #[serde(default)]
    pub trade: bool,
}

impl QueryRequest {
    pub fn new(subnet_id: Option<SubnetId>, account_id: Option<String>) -> Self {
        Self {
            subnet_id,
            account_id,
            trade: false,
        }
    }

    #[must_use]
    pub fn with_trade(mut self, trade: bool) -> Self {
        self.trade = trade;
        self
    }

    /// The cache and single-flight key for this request.
    #[must_use]
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.subnet_id, self.account_id.clone())
    }
}

/// Answer to a [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub subnet_id: Option<SubnetId>,
    pub account_id: Option<String>,
    pub dividend: Dividends,

    /// When the returned value was observed upstream.
    pub timestamp: DateTime<Utc>,

    /// True when served from the cache without an upstream fetch.
    pub cached: bool,

    /// True when a trade job was accepted (or was already queued).
    pub trade_enqueued: bool,
}

/// Dividend read use cases.
///
/// # Errors
///
/// Query methods fail only with
/// [`Error::UpstreamTimeout`](crate::error::Error::UpstreamTimeout) or
/// [`Error::Upstream`](crate::error::Error::Upstream). Cache and dispatcher
/// failures degrade instead of failing the request.
#[async_trait]
pub trait DividendQuery: Send + Sync {
    /// Answer from the cache, or from one shared upstream fetch on a miss.
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse>;

    /// Fetch from upstream without reading or populating the cache.
    async fn query_uncached(&self, key: QueryKey) -> Result<QueryResponse>;

    /// Evict one key, or every dividend entry for `None`.
    /// Returns the number of entries removed.
    async fn purge(&self, key: Option<QueryKey>) -> Result<usize>;
}
