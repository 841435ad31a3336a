//! In-process history log.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{DividendRecord, JobId, QueryKey, TradeOutcome};
use crate::error::Result;
use crate::port::outbound::history::{Appended, ExecutionIntent, HistoryRecord, HistoryStore};

#[derive(Default)]
struct Log {
    dividends: Vec<DividendRecord>,
    outcomes: Vec<TradeOutcome>,
    by_job: HashMap<JobId, usize>,
    intents: HashMap<JobId, ExecutionIntent>,
}

/// History kept in memory for the life of the process.
#[derive(Default)]
pub struct MemoryHistory {
    log: RwLock<Log>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every outcome in append order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<TradeOutcome> {
        self.log.read().outcomes.clone()
    }

    /// Every dividend observation in append order.
    #[must_use]
    pub fn dividends(&self) -> Vec<DividendRecord> {
        self.log.read().dividends.clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append(&self, record: &HistoryRecord) -> Result<Appended> {
        let mut log = self.log.write();
        match record {
            HistoryRecord::Dividends(records) => {
                log.dividends.extend(records.iter().cloned());
                Ok(Appended::Written)
            }
            HistoryRecord::Outcome(outcome) => {
                if log.by_job.contains_key(&outcome.job_id) {
                    return Ok(Appended::AlreadyRecorded);
                }
                let index = log.outcomes.len();
                log.by_job.insert(outcome.job_id.clone(), index);
                log.outcomes.push(outcome.clone());
                Ok(Appended::Written)
            }
        }
    }

    async fn outcome(&self, job_id: &JobId) -> Result<Option<TradeOutcome>> {
        let log = self.log.read();
        Ok(log.by_job.get(job_id).map(|&i| log.outcomes[i].clone()))
    }

    async fn begin_execution(&self, job_id: &JobId, attempt: u32) -> Result<ExecutionIntent> {
        match self.log.write().intents.entry(job_id.clone()) {
            Entry::Occupied(held) => Ok(*held.get()),
            Entry::Vacant(slot) => {
                slot.insert(ExecutionIntent::Held {
                    attempt,
                    started_at: Utc::now(),
                });
                Ok(ExecutionIntent::Began)
            }
        }
    }

    async fn recent_outcomes(&self, limit: usize) -> Result<Vec<TradeOutcome>> {
        Ok(self.log.read().outcomes.iter().rev().take(limit).cloned().collect())
    }

    async fn recent_dividends(&self, key: &QueryKey, limit: usize) -> Result<Vec<DividendRecord>> {
        Ok(self
            .log
            .read()
            .dividends
            .iter()
            .rev()
            .filter(|r| r.within(key))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TradeJob, TradeOutcome};
    use chrono::Utc;

    fn outcome(id: &str) -> TradeOutcome {
        let job = TradeJob {
            job_id: JobId::new(id),
            subnet_id: 1,
            account_id: "hk".into(),
            requested_at: Utc::now(),
        };
        TradeOutcome::skipped(&job, None)
    }

    #[tokio::test]
    async fn one_outcome_per_job() {
        let history = MemoryHistory::new();
        let first = HistoryRecord::Outcome(outcome("a"));
        assert_eq!(history.append(&first).await.unwrap(), Appended::Written);
        assert_eq!(history.append(&first).await.unwrap(), Appended::AlreadyRecorded);
        assert_eq!(history.outcomes().len(), 1);
        assert!(history.exists_outcome(&JobId::new("a")).await.unwrap());
        assert!(!history.exists_outcome(&JobId::new("b")).await.unwrap());
    }

    #[tokio::test]
    async fn intent_is_journalled_once_with_its_owner() {
        let history = MemoryHistory::new();
        let id = JobId::new("a");
        assert_eq!(
            history.begin_execution(&id, 1).await.unwrap(),
            ExecutionIntent::Began
        );
        match history.begin_execution(&id, 2).await.unwrap() {
            ExecutionIntent::Held { attempt, .. } => assert_eq!(attempt, 1),
            ExecutionIntent::Began => panic!("intent journalled twice"),
        }
    }

    #[tokio::test]
    async fn recent_queries_are_newest_first_and_scoped() {
        let history = MemoryHistory::new();
        for id in ["a", "b", "c"] {
            history.append(&HistoryRecord::Outcome(outcome(id))).await.unwrap();
        }
        let recent = history.recent_outcomes(2).await.unwrap();
        assert_eq!(recent[0].job_id, JobId::new("c"));
        assert_eq!(recent[1].job_id, JobId::new("b"));

        let records = vec![
            DividendRecord::new(1, "x", 1, Utc::now()),
            DividendRecord::new(2, "y", 2, Utc::now()),
        ];
        history.append(&HistoryRecord::Dividends(records)).await.unwrap();
        let scoped = history
            .recent_dividends(&QueryKey::new(Some(2), None), 10)
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].account_id, "y");
    }
}
