//! Handler for the `worker` command.

use tokio::sync::watch;
use tracing::info;

use crate::adapter::inbound::cli::command::WorkerArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_worker_pool, Components};
use crate::infrastructure::config::Config;

/// Run trade workers until Ctrl+C.
///
/// In-flight jobs finish before the command returns; anything still queued
/// stays in the dispatcher for the next run.
pub async fn execute(mut config: Config, args: &WorkerArgs) -> Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.worker.concurrency = concurrency.max(1);
    }
    if args.dry_run {
        config.trading.dry_run = true;
    }
    super::require_shared_queue(&config, "worker")?;

    let components = Components::connect(&config)?;
    let pool = build_worker_pool(&config, &components)?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Workers", config.worker.concurrency);
    output::field("Queue", components.dispatcher.name());
    output::field("Pending", components.dispatcher.pending().await?);
    if config.trading.dry_run {
        output::warning("Dry-run mode enabled - trades will be logged, not submitted");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        let _ = shutdown_tx.send(true);
    });

    let report = pool.run(shutdown_rx).await;

    output::section("Summary");
    output::field("Recorded", report.recorded);
    output::field("Duplicates", report.duplicates);
    output::field("In flight", report.in_flight);
    output::field(
        "Errors",
        if report.errors == 0 {
            output::muted(0)
        } else {
            output::negative(report.errors)
        },
    );
    Ok(())
}
