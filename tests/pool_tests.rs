mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use support::service::worker;
use taodiv::adapter::outbound::memory::{MemoryDispatcher, MemoryHistory};
use taodiv::application::trade::{PoolReport, WorkerPool};
use taodiv::domain::OutcomeStatus;
use taodiv::port::outbound::dispatch::TaskDispatcher;
use taodiv::testkit::domain::job;
use taodiv::testkit::trade::{RecordingExecutor, ScriptedAnalyzer};

async fn wait_for_outcomes(history: &MemoryHistory, expected: usize) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while history.outcomes().len() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("outcomes recorded in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_drains_the_queue_and_stops_on_shutdown() {
    let executor = Arc::new(RecordingExecutor::new());
    let history = Arc::new(MemoryHistory::new());
    let dispatcher = Arc::new(MemoryDispatcher::new(100, Duration::from_secs(300)));
    for i in 0..20 {
        dispatcher
            .enqueue(&job(&format!("job-{i}"), 18, "hk"))
            .await
            .unwrap();
    }

    let trade_worker = worker(
        Arc::new(ScriptedAnalyzer::scoring(12)),
        executor.clone(),
        history.clone(),
        dispatcher.clone(),
    );
    let pool = WorkerPool::new(
        Arc::new(trade_worker),
        dispatcher.clone(),
        4,
        Duration::from_millis(10),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(async move { pool.run(shutdown_rx).await });

    wait_for_outcomes(&history, 20).await;
    shutdown_tx.send(true).unwrap();
    let report = running.await.unwrap();

    assert_eq!(
        report,
        PoolReport {
            recorded: 20,
            duplicates: 0,
            in_flight: 0,
            errors: 0,
        }
    );
    assert_eq!(executor.calls(), 20);
    assert_eq!(dispatcher.pending().await.unwrap(), 0);
    assert!(history
        .outcomes()
        .iter()
        .all(|o| o.status == OutcomeStatus::Success));
}

#[tokio::test]
async fn idle_pool_exits_when_shutdown_sender_drops() {
    let dispatcher = Arc::new(MemoryDispatcher::new(10, Duration::from_secs(300)));
    let trade_worker = worker(
        Arc::new(ScriptedAnalyzer::scoring(1)),
        Arc::new(RecordingExecutor::new()),
        Arc::new(MemoryHistory::new()),
        dispatcher.clone(),
    );
    let pool = WorkerPool::new(Arc::new(trade_worker), dispatcher, 2, Duration::from_secs(60));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(async move { pool.run(shutdown_rx).await });
    drop(shutdown_tx);

    let report = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("pool stopped")
        .unwrap();
    assert_eq!(report, PoolReport::default());
}
