mod support;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use support::service::{fast_worker_settings, worker, worker_with};
use taodiv::adapter::outbound::memory::{MemoryDispatcher, MemoryHistory};
use taodiv::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use taodiv::adapter::outbound::sqlite::SqliteHistory;
use taodiv::application::trade::{Processed, TradeWorker, WorkerSettings, UNKNOWN_EXECUTION};
use taodiv::domain::{OutcomeStatus, TradeAction, TradeOutcome};
use taodiv::port::outbound::dispatch::TaskDispatcher;
use taodiv::port::outbound::history::{ExecutionIntent, HistoryStore};
use taodiv::testkit::domain::{delivery, job, redelivery};
use taodiv::testkit::trade::{RecordingExecutor, ScriptedAnalyzer};
use taodiv::testkit::unavailable::{UnavailableDispatcher, UnavailableHistory};

struct Rig {
    analyzer: Arc<ScriptedAnalyzer>,
    executor: Arc<RecordingExecutor>,
    history: Arc<MemoryHistory>,
    dispatcher: Arc<MemoryDispatcher>,
}

impl Rig {
    fn new(analyzer: ScriptedAnalyzer, executor: RecordingExecutor) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            executor: Arc::new(executor),
            history: Arc::new(MemoryHistory::new()),
            dispatcher: Arc::new(MemoryDispatcher::new(100, Duration::from_secs(300))),
        }
    }

    fn worker(&self) -> TradeWorker {
        worker(
            self.analyzer.clone(),
            self.executor.clone(),
            self.history.clone(),
            self.dispatcher.clone(),
        )
    }

    fn worker_with(&self, settings: WorkerSettings) -> TradeWorker {
        worker_with(
            settings,
            self.analyzer.clone(),
            self.executor.clone(),
            self.history.clone(),
            self.dispatcher.clone(),
        )
    }
}

fn recorded(processed: Processed) -> TradeOutcome {
    match processed {
        Processed::Recorded(outcome) => outcome,
        other => panic!("expected a new outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn positive_score_stakes_proportionally() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(40), RecordingExecutor::new());

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.action, TradeAction::Stake);
    assert_eq!(outcome.magnitude, dec!(0.40));
    assert_eq!(outcome.sentiment_score, Some(40));
    assert_eq!(outcome.tx_hash.as_deref(), Some("0xtx1"));

    let orders = rig.executor.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].subnet_id, 18);
    assert_eq!(orders[0].account_id, "hk");
    assert_eq!(rig.history.outcomes(), vec![outcome]);
}

#[tokio::test]
async fn negative_score_unstakes_proportionally() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(-25), RecordingExecutor::new());

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.action, TradeAction::Unstake);
    assert_eq!(outcome.magnitude, dec!(0.25));
}

#[tokio::test]
async fn neutral_score_is_skipped_without_trading() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(0), RecordingExecutor::new());

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Skipped);
    assert_eq!(outcome.action, TradeAction::None);
    assert_eq!(outcome.sentiment_score, Some(0));
    assert_eq!(rig.executor.calls(), 0);
}

#[tokio::test]
async fn missing_sentiment_data_is_skipped() {
    let rig = Rig::new(ScriptedAnalyzer::no_data(), RecordingExecutor::new());

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Skipped);
    assert_eq!(outcome.sentiment_score, None);
    assert_eq!(rig.executor.calls(), 0);
}

#[tokio::test]
async fn redelivered_job_is_not_executed_again() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(40), RecordingExecutor::new());
    let worker = rig.worker();
    let trade = job("j1", 18, "hk");

    recorded(worker.process(&delivery(trade.clone())).await.unwrap());
    let again = worker.process(&redelivery(trade, 2)).await.unwrap();

    assert_eq!(again, Processed::AlreadyRecorded);
    assert_eq!(rig.executor.calls(), 1);
    assert_eq!(rig.analyzer.calls(), 1);
    assert_eq!(rig.history.outcomes().len(), 1);
}

#[tokio::test]
async fn concurrent_deliveries_record_one_outcome() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(15), RecordingExecutor::new());
    let first = rig.worker();
    let second = rig.worker();
    let trade = job("j1", 18, "hk");

    let first_delivery = delivery(trade.clone());
    let second_delivery = redelivery(trade, 2);
    let (a, b) = tokio::join!(
        first.process(&first_delivery),
        second.process(&second_delivery),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(rig.history.outcomes().len(), 1);
    assert!(rig.executor.calls() <= 1);
}

#[tokio::test(start_paused = true)]
async fn scoring_failures_exhaust_into_one_failed_outcome() {
    let rig = Rig::new(ScriptedAnalyzer::failing("rate limited"), RecordingExecutor::new());

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.action, TradeAction::None);
    let detail = outcome.error_detail.unwrap();
    assert!(detail.contains("3 attempt(s)"), "detail: {detail}");
    assert!(detail.contains("rate limited"), "detail: {detail}");
    assert_eq!(rig.analyzer.calls(), 3);
    assert_eq!(rig.executor.calls(), 0);
    assert_eq!(rig.history.outcomes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_scoring_failure_is_retried() {
    let rig = Rig::new(
        ScriptedAnalyzer::scoring(30).failing_first(2, "timeout"),
        RecordingExecutor::new(),
    );

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.magnitude, dec!(0.30));
    assert_eq!(rig.analyzer.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn execution_failures_exhaust_into_failed_outcome_with_decision() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(-50), RecordingExecutor::failing("nonce too low"));

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.action, TradeAction::Unstake);
    assert_eq!(outcome.magnitude, dec!(0.50));
    assert!(outcome.error_detail.unwrap().contains("nonce too low"));
    assert_eq!(rig.executor.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_execution_failure_is_retried() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(10), RecordingExecutor::failing_first(1, "busy"));

    let outcome = recorded(rig.worker().process(&delivery(job("j1", 18, "hk"))).await.unwrap());

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.tx_hash.as_deref(), Some("0xtx2"));
    assert_eq!(rig.executor.calls(), 2);
}

#[tokio::test]
async fn abandoned_execution_intent_is_recorded_as_unknown() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(40), RecordingExecutor::new());
    let trade = job("j1", 18, "hk");

    // A previous delivery crashed between journalling and recording.
    assert_eq!(
        rig.history.begin_execution(&trade.job_id, 1).await.unwrap(),
        ExecutionIntent::Began
    );
    let settings = WorkerSettings {
        intent_timeout: Duration::ZERO,
        ..fast_worker_settings()
    };

    let outcome = recorded(
        rig.worker_with(settings)
            .process(&redelivery(trade, 2))
            .await
            .unwrap(),
    );

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.action, TradeAction::Stake);
    let detail = outcome.error_detail.unwrap();
    assert!(detail.starts_with(UNKNOWN_EXECUTION), "detail: {detail}");
    assert!(detail.contains("attempt 1"), "detail: {detail}");
    assert_eq!(rig.executor.calls(), 0);
}

#[tokio::test]
async fn fresh_execution_intent_leaves_job_queued() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(40), RecordingExecutor::new());
    let trade = job("j1", 18, "hk");
    rig.dispatcher.enqueue(&trade).await.unwrap();
    let leased = rig.dispatcher.dequeue().await.unwrap().unwrap();

    // Another delivery is still executing.
    rig.history.begin_execution(&trade.job_id, 1).await.unwrap();

    let processed = rig.worker().process(&leased).await.unwrap();

    assert_eq!(processed, Processed::InFlight);
    assert!(rig.history.outcomes().is_empty());
    assert_eq!(rig.executor.calls(), 0);
    assert_eq!(rig.dispatcher.pending().await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn overlapping_delivery_keeps_live_success() {
    let rig = Rig::new(
        ScriptedAnalyzer::scoring(40),
        RecordingExecutor::new().settling(Duration::from_secs(1)),
    );
    let first = rig.worker();
    let second = rig.worker();
    let trade = job("j1", 18, "hk");

    let first_delivery = delivery(trade.clone());
    let (a, b) = tokio::join!(first.process(&first_delivery), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        second.process(&redelivery(trade.clone(), 2)).await
    });

    let outcome = recorded(a.unwrap());
    assert_eq!(b.unwrap(), Processed::InFlight);
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.tx_hash.as_deref(), Some("0xtx1"));
    assert_eq!(rig.executor.calls(), 1);

    let stored = rig.history.outcome(&trade.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OutcomeStatus::Success);
    assert_eq!(stored.tx_hash.as_deref(), Some("0xtx1"));
}

#[tokio::test]
async fn job_is_acknowledged_after_its_outcome() {
    let rig = Rig::new(ScriptedAnalyzer::scoring(5), RecordingExecutor::new());
    rig.dispatcher.enqueue(&job("j1", 18, "hk")).await.unwrap();

    let leased = rig.dispatcher.dequeue().await.unwrap().unwrap();
    rig.worker().process(&leased).await.unwrap();

    assert_eq!(rig.dispatcher.pending().await.unwrap(), 0);
    assert!(rig.dispatcher.dequeue().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn unreachable_history_leaves_job_unacknowledged() {
    let executor = Arc::new(RecordingExecutor::new());
    let dispatcher = Arc::new(MemoryDispatcher::new(10, Duration::from_secs(300)));
    let worker = worker(
        Arc::new(ScriptedAnalyzer::scoring(40)),
        executor.clone(),
        Arc::new(UnavailableHistory::new()),
        dispatcher.clone(),
    );
    dispatcher.enqueue(&job("j1", 18, "hk")).await.unwrap();
    let leased = dispatcher.dequeue().await.unwrap().unwrap();

    tokio_test::assert_err!(worker.process(&leased).await);
    assert_eq!(dispatcher.pending().await.unwrap(), 1);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn expired_lease_is_redelivered_and_recorded_once() {
    let analyzer = Arc::new(ScriptedAnalyzer::scoring(20));
    let executor = Arc::new(RecordingExecutor::new());
    let history = Arc::new(MemoryHistory::new());
    let dispatcher = Arc::new(MemoryDispatcher::new(10, Duration::from_secs(1)));
    // Acks go to a queue that is down, so the outcome lands but the lease
    // on `dispatcher` is never released.
    let worker = worker(
        analyzer,
        executor.clone(),
        history.clone(),
        Arc::new(UnavailableDispatcher::new()),
    );

    dispatcher.enqueue(&job("j1", 18, "hk")).await.unwrap();
    let first = dispatcher.dequeue().await.unwrap().unwrap();
    recorded(worker.process(&first).await.unwrap());
    assert_eq!(dispatcher.pending().await.unwrap(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    let retry = dispatcher.dequeue().await.unwrap().unwrap();
    assert_eq!(retry.job.job_id.as_str(), "j1");
    assert_eq!(retry.attempt, 2);

    assert_eq!(worker.process(&retry).await.unwrap(), Processed::AlreadyRecorded);
    assert_eq!(history.outcomes().len(), 1);
    assert_eq!(executor.calls(), 1);
}

#[tokio::test]
async fn sqlite_history_keeps_one_outcome_per_job() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trades.db");
    let pool = create_pool(path.to_str().unwrap(), 4, Duration::from_secs(2)).unwrap();
    run_migrations(&pool).unwrap();
    let history = Arc::new(SqliteHistory::new(pool));

    let executor = Arc::new(RecordingExecutor::new());
    let worker = worker(
        Arc::new(ScriptedAnalyzer::scoring(40)),
        executor.clone(),
        history.clone(),
        Arc::new(MemoryDispatcher::new(10, Duration::from_secs(300))),
    );
    let trade = job("j1", 18, "hk");

    recorded(worker.process(&delivery(trade.clone())).await.unwrap());
    assert_eq!(
        worker.process(&redelivery(trade.clone(), 2)).await.unwrap(),
        Processed::AlreadyRecorded
    );

    let stored = history.outcome(&trade.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OutcomeStatus::Success);
    assert_eq!(stored.magnitude, dec!(0.40));
    assert_eq!(history.recent_outcomes(10).await.unwrap().len(), 1);
    assert_eq!(executor.calls(), 1);
}
