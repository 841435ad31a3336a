//! Cache-aside dividend reads with single-flight upstream fetches.
//!
//! [`DividendQueryService`] is the only implementation of the
//! [`DividendQuery`] inbound port. A read consults the cache, and on a miss
//! joins the one outstanding fetch for that exact [`QueryKey`]. The fetch
//! runs on its own task so a cancelled leader never strands its followers.
//!
//! Cache and dispatcher failures are logged and bypassed; only upstream
//! failures reach the caller. Fresh observations are written to history
//! after the flight lands, so a slow history store never delays a read.
//! [`DividendQueryService::settle`] waits for those writes.

mod flight;

pub use flight::{FlightError, FlightLease, FlightRegistry, FlightResult, Joined, Landed, Waiter};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::trade::JobFactory;
use crate::domain::{DividendRecord, Dividends, QueryKey};
use crate::error::Result;
use crate::port::inbound::query::{DividendQuery, QueryRequest, QueryResponse};
use crate::port::outbound::cache::CacheStore;
use crate::port::outbound::dispatch::{Enqueued, TaskDispatcher};
use crate::port::outbound::history::{HistoryRecord, HistoryStore};
use crate::port::outbound::quote::UpstreamQuoteSource;

/// Timing knobs for the read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    /// How long a fetched result stays valid in the cache.
    pub ttl: Duration,
    /// Bound on one upstream fetch.
    pub upstream_timeout: Duration,
    /// Bound on one enqueue; exceeding it reports `trade_enqueued = false`.
    pub enqueue_timeout: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            upstream_timeout: Duration::from_secs(10),
            enqueue_timeout: Duration::from_millis(500),
        }
    }
}

struct Shared {
    cache: Arc<dyn CacheStore>,
    upstream: Arc<dyn UpstreamQuoteSource>,
    history: Arc<dyn HistoryStore>,
    settings: QuerySettings,
}

/// Cache-aside query orchestrator.
pub struct DividendQueryService {
    shared: Arc<Shared>,
    flights: Arc<FlightRegistry>,
    /// Flight tasks, which outlive their lease while history is written.
    tasks: Mutex<JoinSet<()>>,
    dispatcher: Arc<dyn TaskDispatcher>,
    jobs: JobFactory,
}

impl DividendQueryService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        upstream: Arc<dyn UpstreamQuoteSource>,
        dispatcher: Arc<dyn TaskDispatcher>,
        history: Arc<dyn HistoryStore>,
        jobs: JobFactory,
        settings: QuerySettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache,
                upstream,
                history,
                settings,
            }),
            flights: Arc::new(FlightRegistry::new()),
            tasks: Mutex::new(JoinSet::new()),
            dispatcher,
            jobs,
        }
    }

    /// Number of keys with an upstream fetch outstanding.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// Wait for every started flight, including its history write.
    ///
    /// One-shot callers run this before exiting so observations are not
    /// lost with the runtime.
    pub async fn settle(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Flight task failed");
            }
        }
    }

    async fn cached(&self, key: &QueryKey) -> Option<Dividends> {
        match self.shared.cache.get(key).await {
            Ok(entry) => entry.map(|e| e.value),
            Err(e) => {
                warn!(
                    cache = self.shared.cache.name(),
                    key = %key,
                    error = %e,
                    "Cache read failed, bypassing"
                );
                None
            }
        }
    }

    /// Join or lead the single flight for `key`.
    async fn fetch_shared(&self, key: &QueryKey, populate: bool) -> Result<Landed> {
        let waiter = match self.flights.join(key) {
            Joined::Follower(waiter) => {
                debug!(key = %key, "Joining in-flight fetch");
                waiter
            }
            Joined::Leader(lease, waiter) => {
                let shared = Arc::clone(&self.shared);
                let mut tasks = self.tasks.lock();
                while tasks.try_join_next().is_some() {}
                tasks.spawn(async move {
                    let key = lease.key().clone();
                    let result = shared.fly(&key, populate).await;
                    let observed = match &result {
                        Ok(landed) if !landed.from_cache => landed.dividends.records().to_vec(),
                        _ => Vec::new(),
                    };
                    lease.land(result);
                    shared.record(&key, observed).await;
                });
                waiter
            }
        };
        Ok(waiter.wait().await?)
    }

    async fn enqueue_trade(&self, request: &QueryRequest) -> bool {
        let job = self.jobs.create(
            request.subnet_id,
            request.account_id.as_deref(),
            Utc::now(),
        );
        let limit = self.shared.settings.enqueue_timeout;
        match timeout(limit, self.dispatcher.enqueue(&job)).await {
            Ok(Ok(enqueued)) => {
                info!(
                    job_id = %job.job_id,
                    subnet_id = job.subnet_id,
                    account_id = %job.account_id,
                    duplicate = enqueued == Enqueued::Duplicate,
                    "Trade job enqueued"
                );
                true
            }
            Ok(Err(e)) => {
                warn!(
                    dispatcher = self.dispatcher.name(),
                    job_id = %job.job_id,
                    error = %e,
                    "Trade enqueue failed"
                );
                false
            }
            Err(_) => {
                warn!(
                    dispatcher = self.dispatcher.name(),
                    job_id = %job.job_id,
                    timeout_ms = limit.as_millis() as u64,
                    "Trade enqueue timed out"
                );
                false
            }
        }
    }
}

impl Shared {
    /// Body of one flight, run by the leader's task.
    async fn fly(&self, key: &QueryKey, populate: bool) -> FlightResult {
        // A previous flight may have filled the cache between our miss and
        // taking the lease.
        if populate {
            if let Ok(Some(entry)) = self.cache.get(key).await {
                return Ok(Landed {
                    dividends: entry.value,
                    from_cache: true,
                });
            }
        }

        let limit = self.settings.upstream_timeout;
        let dividends = match timeout(limit, self.upstream.fetch(key)).await {
            Ok(Ok(dividends)) => dividends,
            Ok(Err(e)) => {
                warn!(
                    source = self.upstream.name(),
                    key = %key,
                    error = %e,
                    "Upstream fetch failed"
                );
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    source = self.upstream.name(),
                    key = %key,
                    timeout_ms = limit.as_millis() as u64,
                    "Upstream fetch timed out"
                );
                return Err(FlightError::Timeout(limit));
            }
        };

        if let Err(reason) = dividends.validate_for(key) {
            warn!(
                source = self.upstream.name(),
                key = %key,
                %reason,
                "Rejected malformed upstream result"
            );
            return Err(FlightError::Upstream(reason));
        }

        if populate {
            if let Err(e) = self.cache.put(key, &dividends, self.settings.ttl).await {
                warn!(cache = self.cache.name(), key = %key, error = %e, "Cache write failed");
            }
        }

        debug!(key = %key, records = dividends.records().len(), "Upstream fetch landed");
        Ok(Landed {
            dividends,
            from_cache: false,
        })
    }

    async fn record(&self, key: &QueryKey, records: Vec<DividendRecord>) {
        if records.is_empty() {
            return;
        }
        if let Err(e) = self.history.append(&HistoryRecord::Dividends(records)).await {
            warn!(key = %key, error = %e, "Failed to record dividend observation");
        }
    }
}

fn respond(key: &QueryKey, dividends: Dividends, cached: bool) -> QueryResponse {
    let timestamp = dividends.observed_at().unwrap_or_else(Utc::now);
    QueryResponse {
        subnet_id: key.subnet_id(),
        account_id: key.account_id().map(str::to_string),
        dividend: dividends,
        timestamp,
        cached,
        trade_enqueued: false,
    }
}

#[async_trait]
impl DividendQuery for DividendQueryService {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let key = request.key();

        let mut response = match self.cached(&key).await {
            Some(dividends) => {
                debug!(key = %key, "Cache hit");
                respond(&key, dividends, true)
            }
            None => {
                let landed = self.fetch_shared(&key, true).await?;
                respond(&key, landed.dividends, landed.from_cache)
            }
        };

        if request.trade {
            response.trade_enqueued = self.enqueue_trade(&request).await;
        }
        Ok(response)
    }

    async fn query_uncached(&self, key: QueryKey) -> Result<QueryResponse> {
        let landed = self.fetch_shared(&key, false).await?;
        Ok(respond(&key, landed.dividends, false))
    }

    async fn purge(&self, key: Option<QueryKey>) -> Result<usize> {
        let removed = match &key {
            Some(key) => usize::from(self.shared.cache.evict(key).await?),
            None => self.shared.cache.purge().await?,
        };
        let scope = key.map_or_else(|| "all".to_string(), |k| k.to_string());
        info!(scope = %scope, removed, "Cache purged");
        Ok(removed)
    }
}
