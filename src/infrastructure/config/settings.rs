//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; secrets are only ever read from
//! the environment.
//!
//! # Example
//!
//! ```no_run
//! use taodiv::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::cache::{CacheBackend, CacheConfig};
use super::llm::LlmConfig;
use super::logging::LoggingConfig;
use super::sentiment::SentimentConfig;
use super::trading::{DispatcherConfig, RetryConfig, TradingConfig, WorkerConfig};
use super::upstream::{DefaultsConfig, QuoteSource, UpstreamConfig};
use crate::application::query::QuerySettings;
use crate::adapter::outbound::sqlite::database::connection::BUSY_TIMEOUT;
use crate::application::trade::{JobFactory, WorkerSettings};
use crate::error::{ConfigError, Result};

/// SQLite database for history and the durable job queue.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database file. Defaults to "taodiv.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub path: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Wait for a free pooled connection (milliseconds).
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_size: default_pool_size(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    "taodiv.db".to_string()
}

const fn default_pool_size() -> u32 {
    8
}

const fn default_connection_timeout_ms() -> u64 {
    2_000
}

/// Main application configuration.
///
/// Every section is optional; an empty file yields a runnable local setup
/// apart from the API keys the chosen providers need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Subnet and account for requests that omit them.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub sentiment: SentimentConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub trading: TradingConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Parse configuration from TOML content and apply environment overrides.
    ///
    /// `GATEWAY_API_KEY` sets the gateway token and `REDIS_URL` replaces the
    /// configured Redis URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        config.upstream.api_key = std::env::var("GATEWAY_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        if let Ok(url) = std::env::var("REDIS_URL") {
            if !url.is_empty() {
                config.cache.redis_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed, or
    /// validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Read-path timing.
    #[must_use]
    pub const fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            ttl: self.cache.ttl(),
            upstream_timeout: self.upstream.timeout(),
            enqueue_timeout: self.dispatcher.enqueue_timeout(),
        }
    }

    #[must_use]
    pub fn job_factory(&self) -> JobFactory {
        JobFactory::new(
            self.defaults.subnet_id,
            self.defaults.account_id.clone(),
            self.trading.dedup_window(),
        )
    }

    /// Worker settings; a scoring attempt covers search plus completion and
    /// a history call covers waiting for a connection plus a locked database.
    #[must_use]
    pub fn worker_settings(&self) -> WorkerSettings {
        self.worker.settings(
            self.trading.unit_amount,
            self.sentiment.timeout() + self.llm.timeout(),
            self.trading.execution_timeout(),
            self.database.connection_timeout() + BUSY_TIMEOUT,
        )
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(invalid("ttl_secs", "must be greater than 0"));
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "redis_url" }.into());
        }
        if self.cache.op_timeout_ms == 0 {
            return Err(invalid("op_timeout_ms", "must be greater than 0"));
        }
        let gateway_used = self.upstream.source == QuoteSource::Gateway || !self.trading.dry_run;
        if gateway_used && self.upstream.gateway_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "gateway_url" }.into());
        }
        if self.upstream.timeout_ms == 0 {
            return Err(invalid("timeout_ms", "must be greater than 0"));
        }
        if self.defaults.account_id.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "account_id" }.into());
        }
        if self.sentiment.search_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "search_url" }.into());
        }
        if self.sentiment.max_results == 0 {
            return Err(invalid("max_results", "must be greater than 0"));
        }
        if self.trading.unit_amount <= Decimal::ZERO {
            return Err(invalid("unit_amount", "must be greater than 0"));
        }
        if self.dispatcher.enqueue_timeout_ms == 0 {
            return Err(invalid("enqueue_timeout_ms", "must be greater than 0"));
        }
        if self.dispatcher.capacity == 0 {
            return Err(invalid("capacity", "must be greater than 0"));
        }
        if self.worker.concurrency == 0 {
            return Err(invalid("concurrency", "must be greater than 0"));
        }
        validate_retry("scoring_retry", &self.worker.scoring_retry)?;
        validate_retry("execution_retry", &self.worker.execution_retry)?;
        validate_retry("record_retry", &self.worker.record_retry)?;
        if let Some(budget) = self.worker_settings().job_budget() {
            if self.dispatcher.visibility_timeout() <= budget {
                return Err(invalid(
                    "visibility_timeout_secs",
                    &format!(
                        "must exceed the worst-case job duration of {}s",
                        budget.as_secs_f64().ceil()
                    ),
                ));
            }
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database.path" }.into());
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

#[allow(clippy::result_large_err)]
fn validate_retry(field: &'static str, retry: &RetryConfig) -> Result<()> {
    if retry.max_attempts == 0 {
        return Err(invalid(field, "max_attempts must be greater than 0"));
    }
    if retry.max_delay_ms < retry.initial_delay_ms {
        return Err(invalid(field, "max_delay_ms must be >= initial_delay_ms"));
    }
    if retry.multiplier < 1.0 {
        return Err(invalid(field, "multiplier must be >= 1.0"));
    }
    Ok(())
}
