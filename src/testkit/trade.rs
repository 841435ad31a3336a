//! Scripted sentiment analyzer and recording trade executor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Sentiment, SentimentScore, SubnetId};
use crate::error::{Error, Result};
use crate::port::outbound::executor::{ExecutionReceipt, TradeExecutor, TradeOrder};
use crate::port::outbound::sentiment::SentimentAnalyzer;

#[derive(Debug, Clone)]
enum Answer {
    Score(i32),
    NoData,
    Fail(String),
}

impl Answer {
    fn into_result(self) -> Result<Sentiment> {
        match self {
            Self::Score(value) => Ok(Sentiment::Score(SentimentScore::new(value))),
            Self::NoData => Ok(Sentiment::NoData),
            Self::Fail(reason) => Err(Error::Analyzer(reason)),
        }
    }
}

/// Analyzer with a fixed answer, optionally preceded by scripted ones.
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Answer>>,
    fallback: Answer,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    fn with_fallback(fallback: Answer) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always scores `value` (clamped into range).
    pub fn scoring(value: i32) -> Self {
        Self::with_fallback(Answer::Score(value))
    }

    /// Always reports no data.
    pub fn no_data() -> Self {
        Self::with_fallback(Answer::NoData)
    }

    /// Always fails with an analyzer error.
    pub fn failing(reason: &str) -> Self {
        Self::with_fallback(Answer::Fail(reason.to_string()))
    }

    /// Fail `times` times before falling back to the fixed answer.
    #[must_use]
    pub fn failing_first(self, times: usize, reason: &str) -> Self {
        {
            let mut script = self.script.lock();
            for _ in 0..times {
                script.push_back(Answer::Fail(reason.to_string()));
            }
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentAnalyzer for ScriptedAnalyzer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn score(&self, _subnet_id: SubnetId) -> Result<Sentiment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone()).into_result()
    }
}

/// Executor that records every order it is asked to place.
///
/// Succeeds with hash `0xtx{n}` unless told to fail.
pub struct RecordingExecutor {
    orders: Mutex<Vec<TradeOrder>>,
    failures_left: AtomicUsize,
    failure: String,
    settle: Duration,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::failing_first(0, "rejected")
    }

    /// Fail every call.
    pub fn failing(reason: &str) -> Self {
        Self::failing_first(usize::MAX, reason)
    }

    /// Fail the first `times` calls, then succeed.
    pub fn failing_first(times: usize, reason: &str) -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(times),
            failure: reason.to_string(),
            settle: Duration::ZERO,
        }
    }

    /// Wait `settle` after taking each order before answering, like a chain
    /// waiting for inclusion.
    #[must_use]
    pub fn settling(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Orders received so far, including failed ones.
    pub fn orders(&self) -> Vec<TradeOrder> {
        self.orders.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.orders.lock().len()
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeExecutor for RecordingExecutor {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn execute(&self, order: &TradeOrder) -> Result<ExecutionReceipt> {
        let n = {
            let mut orders = self.orders.lock();
            orders.push(order.clone());
            orders.len()
        };
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        if failing {
            return Err(Error::Executor(self.failure.clone()));
        }
        Ok(ExecutionReceipt {
            tx_hash: Some(format!("0xtx{n}")),
        })
    }
}
