//! Trade jobs, decisions and their recorded outcomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{JobId, SubnetId};
use super::sentiment::SentimentScore;

/// A queued request to trade on a subnet based on its sentiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeJob {
    pub job_id: JobId,
    pub subnet_id: SubnetId,
    pub account_id: String,
    pub requested_at: DateTime<Utc>,
}

/// Direction of a stake change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Stake,
    Unstake,
    None,
}

impl TradeAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Unstake => "unstake",
            Self::None => "none",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stake" => Ok(Self::Stake),
            "unstake" => Ok(Self::Unstake),
            "none" => Ok(Self::None),
            other => Err(format!("unknown trade action '{other}'")),
        }
    }
}

/// Action and size derived from a non-neutral sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeDecision {
    pub action: TradeAction,
    pub magnitude: Decimal,
}

impl TradeDecision {
    /// Map a score onto a stake change of `|score| * unit_amount`.
    ///
    /// Positive scores stake, negative scores unstake, and a neutral score
    /// yields no decision.
    #[must_use]
    pub fn from_score(score: SentimentScore, unit_amount: Decimal) -> Option<Self> {
        let value = score.value();
        let action = match value.signum() {
            1 => TradeAction::Stake,
            -1 => TradeAction::Unstake,
            _ => return None,
        };
        Some(Self {
            action,
            magnitude: Decimal::from(value.unsigned_abs()) * unit_amount,
        })
    }
}

/// Terminal status of a trade job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
    Skipped,
}

impl OutcomeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown outcome status '{other}'")),
        }
    }
}

/// The single terminal record written for a trade job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub job_id: JobId,
    pub subnet_id: SubnetId,
    pub account_id: String,
    pub sentiment_score: Option<i32>,
    pub action: TradeAction,
    pub magnitude: Decimal,
    pub status: OutcomeStatus,
    pub error_detail: Option<String>,
    pub tx_hash: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl TradeOutcome {
    fn base(job: &TradeJob, status: OutcomeStatus) -> Self {
        Self {
            job_id: job.job_id.clone(),
            subnet_id: job.subnet_id,
            account_id: job.account_id.clone(),
            sentiment_score: None,
            action: TradeAction::None,
            magnitude: Decimal::ZERO,
            status,
            error_detail: None,
            tx_hash: None,
            completed_at: Utc::now(),
        }
    }

    /// The executor accepted the stake change.
    #[must_use]
    pub fn success(
        job: &TradeJob,
        score: SentimentScore,
        decision: TradeDecision,
        tx_hash: Option<String>,
    ) -> Self {
        Self {
            sentiment_score: Some(score.value()),
            action: decision.action,
            magnitude: decision.magnitude,
            tx_hash,
            ..Self::base(job, OutcomeStatus::Success)
        }
    }

    /// Nothing to trade: neutral score or no data.
    #[must_use]
    pub fn skipped(job: &TradeJob, score: Option<SentimentScore>) -> Self {
        Self {
            sentiment_score: score.map(SentimentScore::value),
            ..Self::base(job, OutcomeStatus::Skipped)
        }
    }

    /// Scoring or execution failed after retries.
    ///
    /// `decision` is set when the failure happened while executing.
    #[must_use]
    pub fn failed(
        job: &TradeJob,
        score: Option<SentimentScore>,
        decision: Option<TradeDecision>,
        detail: impl Into<String>,
    ) -> Self {
        let (action, magnitude) =
            decision.map_or((TradeAction::None, Decimal::ZERO), |d| (d.action, d.magnitude));
        Self {
            sentiment_score: score.map(SentimentScore::value),
            action,
            magnitude,
            error_detail: Some(detail.into()),
            ..Self::base(job, OutcomeStatus::Failed)
        }
    }
}
