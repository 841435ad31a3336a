use std::sync::Arc;
use std::time::Duration;

use taodiv::adapter::outbound::memory::{MemoryCache, MemoryDispatcher, MemoryHistory};
use taodiv::application::query::{DividendQueryService, QuerySettings};
use taodiv::application::retry::RetryPolicy;
use taodiv::application::trade::{JobFactory, TradeWorker, WorkerSettings};
use taodiv::port::outbound::cache::CacheStore;
use taodiv::port::outbound::dispatch::TaskDispatcher;
use taodiv::port::outbound::executor::TradeExecutor;
use taodiv::port::outbound::history::HistoryStore;
use taodiv::port::outbound::quote::UpstreamQuoteSource;
use taodiv::port::outbound::sentiment::SentimentAnalyzer;
use taodiv::testkit::quote::ScriptedQuoteSource;

pub const DEFAULT_ACCOUNT: &str = "5FFApaS75bv5pJHfAp2FVLBj9ZaXuFDjEypsaBNc1wCfe52v";

pub fn job_factory() -> JobFactory {
    JobFactory::new(18, DEFAULT_ACCOUNT, Duration::from_secs(60))
}

/// Everything a query test wants to inspect after the fact.
pub struct QueryHarness {
    pub service: DividendQueryService,
    pub upstream: Arc<ScriptedQuoteSource>,
    pub cache: Arc<dyn CacheStore>,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub history: Arc<MemoryHistory>,
}

pub struct QueryHarnessBuilder {
    upstream: ScriptedQuoteSource,
    cache: Arc<dyn CacheStore>,
    dispatcher: Arc<dyn TaskDispatcher>,
    history: Option<Arc<dyn HistoryStore>>,
    settings: QuerySettings,
}

impl QueryHarnessBuilder {
    pub fn new(upstream: ScriptedQuoteSource) -> Self {
        Self {
            upstream,
            cache: Arc::new(MemoryCache::new()),
            dispatcher: Arc::new(MemoryDispatcher::new(100, Duration::from_secs(300))),
            history: None,
            settings: QuerySettings::default(),
        }
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn TaskDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replaces the recording history; `QueryHarness::history` then stays empty.
    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn upstream_timeout(mut self, limit: Duration) -> Self {
        self.settings.upstream_timeout = limit;
        self
    }

    pub fn build(self) -> QueryHarness {
        let upstream = Arc::new(self.upstream);
        let history = Arc::new(MemoryHistory::new());
        let service = DividendQueryService::new(
            Arc::clone(&self.cache),
            Arc::clone(&upstream) as Arc<dyn UpstreamQuoteSource>,
            Arc::clone(&self.dispatcher),
            self.history
                .unwrap_or_else(|| Arc::clone(&history) as Arc<dyn HistoryStore>),
            job_factory(),
            self.settings,
        );
        QueryHarness {
            service,
            upstream,
            cache: self.cache,
            dispatcher: self.dispatcher,
            history,
        }
    }
}

/// Worker settings with short, deterministic retries.
pub fn fast_worker_settings() -> WorkerSettings {
    let retry = |attempts| RetryPolicy {
        max_attempts: attempts,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        multiplier: 2.0,
        attempt_timeout: None,
    };
    WorkerSettings {
        scoring: retry(3),
        execution: retry(2),
        record: retry(2),
        intent_timeout: Duration::from_secs(60),
        ..WorkerSettings::default()
    }
}

pub fn worker(
    analyzer: Arc<dyn SentimentAnalyzer>,
    executor: Arc<dyn TradeExecutor>,
    history: Arc<dyn HistoryStore>,
    dispatcher: Arc<dyn TaskDispatcher>,
) -> TradeWorker {
    worker_with(fast_worker_settings(), analyzer, executor, history, dispatcher)
}

pub fn worker_with(
    settings: WorkerSettings,
    analyzer: Arc<dyn SentimentAnalyzer>,
    executor: Arc<dyn TradeExecutor>,
    history: Arc<dyn HistoryStore>,
    dispatcher: Arc<dyn TaskDispatcher>,
) -> TradeWorker {
    TradeWorker::new(analyzer, executor, history, dispatcher, settings)
}
