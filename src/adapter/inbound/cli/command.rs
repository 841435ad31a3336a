//! Command-line interface definitions.
//!
//! Defines the CLI structure for taodiv using `clap`: dividend queries, the
//! trade worker, cache maintenance, history views and configuration checks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{QueryKey, SubnetId};

/// Cached subnet dividend queries with sentiment-driven staking
#[derive(Parser, Debug)]
#[command(name = "taodiv")]
#[command(version, about)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query dividends, optionally queueing a sentiment trade
    Query(QueryArgs),

    /// Run trade workers until interrupted
    Worker(WorkerArgs),

    /// Manage the dividend cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// View recorded observations and trade outcomes
    #[command(subcommand)]
    History(HistoryCommand),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subnet and account selection. A missing part is a wildcard.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Subnet id (netuid); omit for every subnet
    #[arg(long)]
    pub subnet: Option<SubnetId>,

    /// Account hotkey; omit for every account in scope
    #[arg(long)]
    pub account: Option<String>,
}

impl ScopeArgs {
    #[must_use]
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.subnet, self.account.clone())
    }
}

/// Arguments for `taodiv query`.
#[derive(Parser, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Queue a sentiment-driven stake change for the subnet
    #[arg(long)]
    pub trade: bool,

    /// Always fetch upstream; neither read nor populate the cache
    #[arg(long, conflicts_with = "trade")]
    pub no_cache: bool,
}

/// Arguments for `taodiv worker`.
#[derive(Parser, Debug)]
pub struct WorkerArgs {
    /// Override the configured number of concurrent workers
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Log trades instead of submitting them
    #[arg(long)]
    pub dry_run: bool,
}

/// Subcommands for `taodiv cache`.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Evict one cached query, or every entry with --all
    Purge(PurgeArgs),
}

/// Arguments for `taodiv cache purge`.
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Remove every cached dividend entry
    #[arg(long, conflicts_with_all = ["subnet", "account"])]
    pub all: bool,
}

/// Subcommands for `taodiv history`.
#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Most recent trade outcomes
    Outcomes(LimitArgs),
    /// Most recent dividend observations
    Dividends(DividendHistoryArgs),
}

/// Row limit for history views.
#[derive(clap::Args, Debug, Clone)]
pub struct LimitArgs {
    /// Maximum rows to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Arguments for `taodiv history dividends`.
#[derive(Parser, Debug)]
pub struct DividendHistoryArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    #[command(flatten)]
    pub limit: LimitArgs,
}

/// Subcommands for `taodiv check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file and report missing secrets
    Config,
}
