//! Scripted [`UpstreamQuoteSource`] for read-path tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{DividendRecord, Dividends, QueryKey};
use crate::error::Result;
use crate::port::outbound::quote::UpstreamQuoteSource;

/// Upstream that counts calls, can be slowed down, and pops scripted results.
///
/// When the script is exhausted every fetch answers with `value` for the
/// requested key: a single record for a specific key, a one-element list
/// for a wildcard key (wildcard parts become subnet 0 / account "all").
pub struct ScriptedQuoteSource {
    value: u64,
    delay: Duration,
    script: Mutex<VecDeque<Result<Dividends>>>,
    calls: AtomicUsize,
}

impl ScriptedQuoteSource {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            delay: Duration::ZERO,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` (tokio time) before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue results returned by the next fetches, in order.
    #[must_use]
    pub fn with_script(self, results: Vec<Result<Dividends>>) -> Self {
        *self.script.lock() = results.into();
        self
    }

    /// Queue one more result.
    pub fn push(&self, result: Result<Dividends>) {
        self.script.lock().push_back(result);
    }

    /// Fetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, key: &QueryKey) -> Dividends {
        let record = DividendRecord::new(
            key.subnet_id().unwrap_or(0),
            key.account_id().unwrap_or("all"),
            self.value,
            Utc::now(),
        );
        if key.is_aggregate() {
            Dividends::Aggregate(vec![record])
        } else {
            Dividends::Single(record)
        }
    }
}

#[async_trait]
impl UpstreamQuoteSource for ScriptedQuoteSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, key: &QueryKey) -> Result<Dividends> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(self.answer(key)))
    }
}
