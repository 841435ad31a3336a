//! Composition root: builds the component graph from [`Config`].
//!
//! Shared collaborators (cache, dispatcher, history) are created once in
//! [`Components::connect`] and handed by reference to the query service and
//! the worker pool. Dropping [`Components`] releases their connections.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::adapter::outbound::datura::DaturaSearch;
use crate::adapter::outbound::gateway::{GatewayClient, GatewayExecutor, GatewayQuoteSource};
use crate::adapter::outbound::llm::{Anthropic, Chutes, OpenAi};
use crate::adapter::outbound::memory::{MemoryCache, MemoryDispatcher};
use crate::adapter::outbound::simulated::{DryRunExecutor, SimulatedQuoteSource};
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations, DbPool};
use crate::adapter::outbound::sqlite::{SqliteDispatcher, SqliteHistory};
use crate::application::query::DividendQueryService;
use crate::application::sentiment::LlmSentimentAnalyzer;
use crate::application::trade::{TradeWorker, WorkerPool};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::cache::CacheBackend;
use crate::infrastructure::config::llm::{LlmConfig, LlmProvider};
use crate::infrastructure::config::trading::DispatcherBackend;
use crate::infrastructure::config::upstream::QuoteSource;
use crate::infrastructure::config::Config;
use crate::port::outbound::cache::CacheStore;
use crate::port::outbound::dispatch::TaskDispatcher;
use crate::port::outbound::executor::TradeExecutor;
use crate::port::outbound::history::HistoryStore;
use crate::port::outbound::llm::Llm;
use crate::port::outbound::quote::UpstreamQuoteSource;
use crate::port::outbound::sentiment::SentimentAnalyzer;

/// Collaborators shared by the read path and the workers.
pub struct Components {
    pub cache: Arc<dyn CacheStore>,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub history: Arc<dyn HistoryStore>,
}

impl Components {
    /// Open the database, run migrations and build the shared adapters.
    ///
    /// The Redis cache connects lazily on first use, so an unreachable
    /// server does not prevent startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or if
    /// the configured cache backend cannot be built.
    pub fn connect(config: &Config) -> Result<Self> {
        let pool = open_database(config)?;
        let cache = build_cache(config)?;
        let dispatcher = build_dispatcher(config, &pool);
        let history: Arc<dyn HistoryStore> = Arc::new(SqliteHistory::new(pool));

        info!(
            cache = cache.name(),
            dispatcher = dispatcher.name(),
            "Components connected"
        );
        Ok(Self {
            cache,
            dispatcher,
            history,
        })
    }
}

/// Open the SQLite pool and apply pending migrations.
///
/// # Errors
///
/// Returns an error if the pool cannot be created or migrations fail.
pub fn open_database(config: &Config) -> Result<DbPool> {
    let pool = create_pool(
        &config.database.path,
        config.database.pool_size,
        config.database.connection_timeout(),
    )?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Build the dividend query service over shared components.
///
/// # Errors
///
/// Returns an error if the upstream source cannot be built.
pub fn build_query_service(config: &Config, components: &Components) -> Result<DividendQueryService> {
    Ok(DividendQueryService::new(
        Arc::clone(&components.cache),
        build_upstream(config)?,
        Arc::clone(&components.dispatcher),
        Arc::clone(&components.history),
        config.job_factory(),
        config.query_settings(),
    ))
}

/// Build the trade worker pool over shared components.
///
/// # Errors
///
/// Returns an error if an API key for the analyzer or executor is missing.
pub fn build_worker_pool(config: &Config, components: &Components) -> Result<WorkerPool> {
    let worker = TradeWorker::new(
        build_analyzer(config)?,
        build_executor(config)?,
        Arc::clone(&components.history),
        Arc::clone(&components.dispatcher),
        config.worker_settings(),
    );
    Ok(WorkerPool::new(
        Arc::new(worker),
        Arc::clone(&components.dispatcher),
        config.worker.concurrency,
        config.worker.poll_interval(),
    ))
}

/// Build the configured cache backend.
///
/// # Errors
///
/// Returns an error if the Redis URL is invalid or Redis support is not
/// compiled in.
pub fn build_cache(config: &Config) -> Result<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheBackend::Redis => build_redis_cache(config),
    }
}

#[cfg(feature = "redis")]
fn build_redis_cache(config: &Config) -> Result<Arc<dyn CacheStore>> {
    use crate::adapter::outbound::redis::RedisCache;

    let cache = RedisCache::new(
        &config.cache.redis_url,
        config.cache.key_prefix.clone(),
        config.cache.op_timeout(),
    )?;
    Ok(Arc::new(cache))
}

#[cfg(not(feature = "redis"))]
fn build_redis_cache(_config: &Config) -> Result<Arc<dyn CacheStore>> {
    Err(ConfigError::InvalidValue {
        field: "cache.backend",
        reason: "redis support requires the redis feature".to_string(),
    }
    .into())
}

fn build_dispatcher(config: &Config, pool: &DbPool) -> Arc<dyn TaskDispatcher> {
    let visibility = config.dispatcher.visibility_timeout();
    match config.dispatcher.backend {
        DispatcherBackend::Sqlite => Arc::new(SqliteDispatcher::new(pool.clone(), visibility)),
        DispatcherBackend::Memory => {
            warn!("Memory dispatcher selected; queued trades do not outlive this process");
            Arc::new(MemoryDispatcher::new(config.dispatcher.capacity, visibility))
        }
    }
}

/// Build the configured dividend source.
///
/// # Errors
///
/// Returns an error if the gateway URL is invalid.
pub fn build_upstream(config: &Config) -> Result<Arc<dyn UpstreamQuoteSource>> {
    let upstream = &config.upstream;
    let source: Arc<dyn UpstreamQuoteSource> = match upstream.source {
        QuoteSource::Gateway => Arc::new(GatewayQuoteSource::new(gateway_client(config)?)),
        QuoteSource::Simulated => Arc::new(SimulatedQuoteSource::new(
            Duration::from_millis(upstream.simulated_latency_ms),
            upstream.simulated_dividend,
            config.defaults.subnet_id,
            config.defaults.account_id.clone(),
        )),
    };
    info!(source = source.name(), "Upstream source initialized");
    Ok(source)
}

/// Build the trade executor; dry runs never touch the gateway.
///
/// # Errors
///
/// Returns an error if the gateway URL is invalid.
pub fn build_executor(config: &Config) -> Result<Arc<dyn TradeExecutor>> {
    if config.trading.dry_run {
        info!("Dry-run mode enabled - trades will be logged, not submitted");
        return Ok(Arc::new(DryRunExecutor));
    }
    let client = GatewayClient::new(
        &config.upstream.gateway_url,
        config.upstream.api_key.clone(),
        config.trading.execution_timeout(),
    )?;
    Ok(Arc::new(GatewayExecutor::new(client)))
}

/// Build the tweet-search plus LLM sentiment analyzer.
///
/// # Errors
///
/// Returns an error if `DATURA_API_KEY` or the provider's key is not set.
pub fn build_analyzer(config: &Config) -> Result<Arc<dyn SentimentAnalyzer>> {
    let search = DaturaSearch::from_env(config.sentiment.search_url.clone())?
        .with_timeout(config.sentiment.timeout());
    let llm = build_llm_client(&config.llm)?;
    info!(provider = llm.name(), "LLM client initialized");
    Ok(Arc::new(LlmSentimentAnalyzer::new(
        Arc::new(search),
        llm,
        config.sentiment.settings(),
    )))
}

/// Build the configured LLM client.
///
/// # Errors
///
/// Returns an error if the provider's API key is not set.
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn Llm>> {
    let timeout = config.timeout();
    let client: Arc<dyn Llm> = match config.provider {
        LlmProvider::Chutes => Arc::new(
            Chutes::new(
                api_key("CHUTES_API_KEY")?,
                config.chutes.endpoint.clone(),
                config.chutes.temperature,
                config.chutes.top_p,
            )
            .with_timeout(timeout),
        ),
        LlmProvider::Anthropic => Arc::new(
            Anthropic::new(
                api_key("ANTHROPIC_API_KEY")?,
                &config.anthropic.model,
                config.anthropic.max_tokens,
                config.anthropic.temperature,
            )
            .with_timeout(timeout),
        ),
        LlmProvider::OpenAi => Arc::new(
            OpenAi::new(
                api_key("OPENAI_API_KEY")?,
                &config.openai.model,
                config.openai.max_tokens,
                config.openai.temperature,
            )
            .with_timeout(timeout),
        ),
    };
    Ok(client)
}

fn gateway_client(config: &Config) -> Result<GatewayClient> {
    GatewayClient::new(
        &config.upstream.gateway_url,
        config.upstream.api_key.clone(),
        config.upstream.timeout(),
    )
}

fn api_key(var: &'static str) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::MissingField { field: var }.into())
}
