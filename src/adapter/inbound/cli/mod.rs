//! CLI module graph.

pub mod cache;
pub mod check;
pub mod command;
pub mod history;
pub mod output;
pub mod query;
pub mod worker;

use crate::error::{ConfigError, Result};
use crate::infrastructure::config::cache::CacheBackend;
use crate::infrastructure::config::trading::DispatcherBackend;
use crate::infrastructure::config::Config;
use command::{CacheCommand, CheckCommand, Cli, Commands, HistoryCommand};

/// Refuse a job queue that would vanish when this process exits.
///
/// # Errors
///
/// Returns a configuration error for the memory dispatcher.
#[allow(clippy::result_large_err)]
pub fn require_shared_queue(config: &Config, command: &str) -> Result<()> {
    if config.dispatcher.backend == DispatcherBackend::Memory {
        return Err(ConfigError::InvalidValue {
            field: "dispatcher.backend",
            reason: format!(
                "`{command}` needs a queue shared with other processes; the memory queue is lost on exit"
            ),
        }
        .into());
    }
    Ok(())
}

/// Refuse a cache that only this process can see.
///
/// # Errors
///
/// Returns a configuration error for the memory cache.
#[allow(clippy::result_large_err)]
pub fn require_shared_cache(config: &Config, command: &str) -> Result<()> {
    if config.cache.backend == CacheBackend::Memory {
        return Err(ConfigError::InvalidValue {
            field: "cache.backend",
            reason: format!(
                "`{command}` needs a cache shared with other processes; the memory cache is empty in every new process"
            ),
        }
        .into());
    }
    Ok(())
}

/// Dispatch a parsed command line.
///
/// Logging is initialised from the loaded configuration; `-v` raises the
/// level to debug unless `RUST_LOG` is set.
pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Check(CheckCommand::Config) = cli.command {
        return check::config(&cli.config);
    }

    let mut config = Config::load(&cli.config)?;
    if cli.verbose > 0 {
        config.logging.level = "debug".into();
    }
    if cli.json {
        config.logging.format = "json".into();
    }
    config.init_logging();

    match &cli.command {
        Commands::Query(args) => query::execute(&config, args).await,
        Commands::Worker(args) => worker::execute(config, args).await,
        Commands::Cache(CacheCommand::Purge(args)) => cache::purge(&config, args).await,
        Commands::History(HistoryCommand::Outcomes(args)) => history::outcomes(&config, args).await,
        Commands::History(HistoryCommand::Dividends(args)) => {
            history::dividends(&config, args).await
        }
        Commands::Check(CheckCommand::Config) => check::config(&cli.config),
    }
}
