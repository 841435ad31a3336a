//! Idempotent execution of one trade job.
//!
//! Each delivery walks `RECEIVED -> SCORING -> DECIDING -> EXECUTING` and
//! ends in exactly one recorded outcome (success, failed or skipped). The
//! job is acknowledged only after its outcome is durably written, so a crash
//! anywhere before that leads to redelivery, never loss.
//!
//! Redelivered jobs are recognised twice: once on receipt and again right
//! before execution. An execution intent is journalled before the executor
//! is called. A delivery that finds another delivery's intent steps aside
//! while that intent is younger than the execution window, leaving the job
//! unacknowledged; once the intent is older than that, the owner is presumed
//! dead and the job is recorded as failed with an unknown execution outcome
//! instead of trading again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::application::retry::RetryPolicy;
use crate::domain::{JobId, Sentiment, SentimentScore, TradeDecision, TradeOutcome};
use crate::error::Result;
use crate::port::outbound::dispatch::{Delivery, TaskDispatcher};
use crate::port::outbound::executor::{TradeExecutor, TradeOrder};
use crate::port::outbound::history::{Appended, ExecutionIntent, HistoryRecord, HistoryStore};
use crate::port::outbound::sentiment::SentimentAnalyzer;

/// Prefix of `error_detail` when a previous delivery may have traded.
pub const UNKNOWN_EXECUTION: &str = "execution outcome unknown";

/// History calls one delivery makes: two outcome checks, the intent and the
/// outcome write.
const RECORD_CALLS: u32 = 4;

/// Retry and sizing knobs for the worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// TAO per sentiment point.
    pub unit_amount: Decimal,
    pub scoring: RetryPolicy,
    pub execution: RetryPolicy,
    /// Retries for history reads and writes.
    pub record: RetryPolicy,
    /// Age after which another delivery's execution intent is presumed
    /// abandoned.
    pub intent_timeout: Duration,
}

impl WorkerSettings {
    /// Longest one delivery can take from dequeue to acknowledgement.
    ///
    /// `None` unless every policy bounds its attempts.
    #[must_use]
    pub fn job_budget(&self) -> Option<Duration> {
        Some(
            self.scoring.worst_case()?
                + self.execution.worst_case()?
                + self.record.worst_case()? * RECORD_CALLS,
        )
    }

    /// Longest a live delivery can hold an intent before its outcome is
    /// written.
    #[must_use]
    pub fn execution_window(&self) -> Option<Duration> {
        Some(self.execution.worst_case()? + self.record.worst_case()?)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            unit_amount: Decimal::new(1, 2),
            scoring: RetryPolicy::default(),
            execution: RetryPolicy {
                max_attempts: 2,
                ..RetryPolicy::default()
            },
            record: RetryPolicy::default(),
            intent_timeout: Duration::from_secs(600),
        }
    }
}

/// How a delivery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// This delivery wrote the job's outcome.
    Recorded(TradeOutcome),
    /// An outcome already existed; nothing was executed or written.
    AlreadyRecorded,
    /// Another live delivery is executing the job. Nothing was written and
    /// the job was left unacknowledged.
    InFlight,
}

/// Where a delivery stopped before committing.
enum Terminal {
    Outcome(TradeOutcome),
    AlreadyRecorded,
    InFlight,
}

/// Runs sentiment scoring and trade execution for queued jobs.
pub struct TradeWorker {
    analyzer: Arc<dyn SentimentAnalyzer>,
    executor: Arc<dyn TradeExecutor>,
    history: Arc<dyn HistoryStore>,
    dispatcher: Arc<dyn TaskDispatcher>,
    settings: WorkerSettings,
}

impl TradeWorker {
    pub fn new(
        analyzer: Arc<dyn SentimentAnalyzer>,
        executor: Arc<dyn TradeExecutor>,
        history: Arc<dyn HistoryStore>,
        dispatcher: Arc<dyn TaskDispatcher>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            analyzer,
            executor,
            history,
            dispatcher,
            settings,
        }
    }

    /// Drive one delivery to a recorded outcome and acknowledge it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the history store stays unreachable after
    /// retries. The job is then left unacknowledged for redelivery.
    pub async fn process(&self, delivery: &Delivery) -> Result<Processed> {
        let job = &delivery.job;
        debug!(
            job_id = %job.job_id,
            attempt = delivery.attempt,
            state = "received",
            "Processing trade job"
        );

        if self.outcome_exists(&job.job_id).await? {
            info!(job_id = %job.job_id, "Outcome already recorded, skipping redelivery");
            self.ack(&job.job_id).await;
            return Ok(Processed::AlreadyRecorded);
        }

        let terminal = self.run(delivery).await?;
        let processed = match terminal {
            Terminal::AlreadyRecorded => Processed::AlreadyRecorded,
            Terminal::InFlight => return Ok(Processed::InFlight),
            Terminal::Outcome(outcome) => self.commit(outcome).await?,
        };
        self.ack(&job.job_id).await;
        Ok(processed)
    }

    async fn run(&self, delivery: &Delivery) -> Result<Terminal> {
        let job = &delivery.job;
        debug!(
            job_id = %job.job_id,
            subnet_id = job.subnet_id,
            state = "scoring",
            "Scoring sentiment"
        );
        let sentiment = match self
            .settings
            .scoring
            .run("sentiment", |_| self.analyzer.score(job.subnet_id))
            .await
        {
            Ok(sentiment) => sentiment,
            Err(exhausted) => {
                let detail = format!(
                    "sentiment scoring failed after {} attempt(s): {}",
                    exhausted.attempts, exhausted.last_error
                );
                return Ok(Terminal::Outcome(TradeOutcome::failed(job, None, None, detail)));
            }
        };

        let score = match sentiment {
            Sentiment::NoData => {
                debug!(job_id = %job.job_id, state = "deciding", "No sentiment data");
                return Ok(Terminal::Outcome(TradeOutcome::skipped(job, None)));
            }
            Sentiment::Score(score) => SentimentScore::new(score.value()),
        };

        let Some(decision) = TradeDecision::from_score(score, self.settings.unit_amount) else {
            debug!(job_id = %job.job_id, state = "deciding", "Neutral sentiment");
            return Ok(Terminal::Outcome(TradeOutcome::skipped(job, Some(score))));
        };

        if self.outcome_exists(&job.job_id).await? {
            return Ok(Terminal::AlreadyRecorded);
        }
        self.execute(delivery, score, decision).await
    }

    async fn execute(
        &self,
        delivery: &Delivery,
        score: SentimentScore,
        decision: TradeDecision,
    ) -> Result<Terminal> {
        let job = &delivery.job;
        let intent = self
            .settings
            .record
            .run("begin_execution", |_| {
                self.history.begin_execution(&job.job_id, delivery.attempt)
            })
            .await
            .map_err(|e| e.last_error)?;
        if let ExecutionIntent::Held {
            attempt,
            started_at,
        } = intent
        {
            let age = (Utc::now() - started_at).to_std().unwrap_or_default();
            if age < self.settings.intent_timeout {
                info!(
                    job_id = %job.job_id,
                    owner_attempt = attempt,
                    age_ms = age.as_millis() as u64,
                    "Another delivery is executing this job, leaving it queued"
                );
                return Ok(Terminal::InFlight);
            }
            warn!(
                job_id = %job.job_id,
                owner_attempt = attempt,
                age_ms = age.as_millis() as u64,
                "Earlier delivery began execution without an outcome"
            );
            let detail = format!(
                "{UNKNOWN_EXECUTION}: delivery attempt {attempt} began execution at {started_at} but recorded no outcome"
            );
            return Ok(Terminal::Outcome(TradeOutcome::failed(
                job,
                Some(score),
                Some(decision),
                detail,
            )));
        }

        let order = TradeOrder {
            job_id: job.job_id.clone(),
            subnet_id: job.subnet_id,
            account_id: job.account_id.clone(),
            action: decision.action,
            magnitude: decision.magnitude,
        };
        debug!(
            job_id = %job.job_id,
            state = "executing",
            action = %order.action,
            magnitude = %order.magnitude,
            executor = self.executor.name(),
            "Executing trade"
        );

        match self
            .settings
            .execution
            .run("execute", |_| self.executor.execute(&order))
            .await
        {
            Ok(receipt) => Ok(Terminal::Outcome(TradeOutcome::success(
                job,
                score,
                decision,
                receipt.tx_hash,
            ))),
            Err(exhausted) => {
                let detail = format!(
                    "execution failed after {} attempt(s): {}",
                    exhausted.attempts, exhausted.last_error
                );
                Ok(Terminal::Outcome(TradeOutcome::failed(
                    job,
                    Some(score),
                    Some(decision),
                    detail,
                )))
            }
        }
    }

    async fn commit(&self, outcome: TradeOutcome) -> Result<Processed> {
        let record = HistoryRecord::Outcome(outcome.clone());
        let appended = self
            .settings
            .record
            .run("record_outcome", |_| self.history.append(&record))
            .await
            .map_err(|e| e.last_error)?;

        match appended {
            Appended::Written => {
                info!(
                    job_id = %outcome.job_id,
                    status = %outcome.status,
                    action = %outcome.action,
                    magnitude = %outcome.magnitude,
                    score = ?outcome.sentiment_score,
                    "Trade outcome recorded"
                );
                Ok(Processed::Recorded(outcome))
            }
            Appended::AlreadyRecorded => {
                info!(job_id = %outcome.job_id, "Outcome recorded by another delivery");
                Ok(Processed::AlreadyRecorded)
            }
        }
    }

    async fn outcome_exists(&self, job_id: &JobId) -> Result<bool> {
        self.settings
            .record
            .run("exists_outcome", |_| self.history.exists_outcome(job_id))
            .await
            .map_err(|e| e.last_error)
    }

    async fn ack(&self, job_id: &JobId) {
        if let Err(e) = self.dispatcher.ack(job_id).await {
            // The outcome is written, so a redelivery short-circuits.
            warn!(job_id = %job_id, error = %e, "Failed to acknowledge trade job");
        }
    }
}
