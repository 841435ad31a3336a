//! Concurrent trade workers with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::worker::{Processed, TradeWorker};
use crate::port::outbound::dispatch::TaskDispatcher;

/// Totals across all workers for one [`WorkerPool::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Deliveries that wrote an outcome.
    pub recorded: u64,
    /// Deliveries that found an outcome already written.
    pub duplicates: u64,
    /// Deliveries that stepped aside for another live delivery of the job.
    pub in_flight: u64,
    /// Deliveries left unacknowledged because history was unreachable.
    pub errors: u64,
}

impl PoolReport {
    fn merge(&mut self, other: Self) {
        self.recorded += other.recorded;
        self.duplicates += other.duplicates;
        self.in_flight += other.in_flight;
        self.errors += other.errors;
    }
}

/// Polls the dispatcher from `concurrency` tasks.
///
/// Distinct workers never hold the same job at once; that is the
/// dispatcher's lease guarantee, not a lock here.
pub struct WorkerPool {
    worker: Arc<TradeWorker>,
    dispatcher: Arc<dyn TaskDispatcher>,
    concurrency: usize,
    poll_interval: Duration,
}

impl WorkerPool {
    pub fn new(
        worker: Arc<TradeWorker>,
        dispatcher: Arc<dyn TaskDispatcher>,
        concurrency: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            worker,
            dispatcher,
            concurrency: concurrency.max(1),
            poll_interval,
        }
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    ///
    /// Jobs already being processed run to completion before returning.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> PoolReport {
        info!(
            concurrency = self.concurrency,
            dispatcher = self.dispatcher.name(),
            "Trade workers starting"
        );

        let mut tasks = JoinSet::new();
        for index in 0..self.concurrency {
            let worker = Arc::clone(&self.worker);
            let dispatcher = Arc::clone(&self.dispatcher);
            let shutdown = shutdown.clone();
            let poll_interval = self.poll_interval;
            tasks.spawn(worker_loop(index, worker, dispatcher, poll_interval, shutdown));
        }

        let mut report = PoolReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(partial) => report.merge(partial),
                Err(e) => error!(error = %e, "Trade worker task failed"),
            }
        }

        info!(
            recorded = report.recorded,
            duplicates = report.duplicates,
            in_flight = report.in_flight,
            errors = report.errors,
            "Trade workers stopped"
        );
        report
    }
}

/// Wait for `interval` unless shutdown arrives first. Returns true on shutdown.
async fn idle(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
        () = tokio::time::sleep(interval) => false,
    }
}

async fn worker_loop(
    index: usize,
    worker: Arc<TradeWorker>,
    dispatcher: Arc<dyn TaskDispatcher>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> PoolReport {
    let mut report = PoolReport::default();
    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            next = dispatcher.dequeue() => next,
        };

        match next {
            Ok(Some(delivery)) => match worker.process(&delivery).await {
                Ok(Processed::Recorded(_)) => report.recorded += 1,
                Ok(Processed::AlreadyRecorded) => report.duplicates += 1,
                Ok(Processed::InFlight) => report.in_flight += 1,
                Err(e) => {
                    report.errors += 1;
                    warn!(
                        worker = index,
                        job_id = %delivery.job.job_id,
                        error = %e,
                        "Trade job left for redelivery"
                    );
                }
            },
            Ok(None) => {
                if idle(poll_interval, &mut shutdown).await {
                    break;
                }
            }
            Err(e) => {
                warn!(worker = index, error = %e, "Dequeue failed");
                if idle(poll_interval, &mut shutdown).await {
                    break;
                }
            }
        }
    }
    debug!(worker = index, "Trade worker exiting");
    report
}
