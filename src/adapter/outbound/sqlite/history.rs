//! SQLite history log.
//!
//! Dividend observations and trade outcomes are append-only tables; the
//! unique `job_id` on `trade_outcomes` enforces one outcome per job even
//! with several workers writing at once.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::database::connection::{format_timestamp, interact, parse_timestamp, DbPool};
use super::database::model::{DividendRow, IntentRow, NewDividendRow, NewOutcomeRow, OutcomeRow};
use super::database::schema::{dividends, execution_intents, trade_outcomes};
use crate::domain::{
    DividendRecord, JobId, OutcomeStatus, QueryKey, SubnetId, TradeAction, TradeOutcome,
};
use crate::error::{Error, Result};
use crate::port::outbound::history::{Appended, ExecutionIntent, HistoryRecord, HistoryStore};

fn db_err(e: diesel::result::Error) -> Error {
    Error::Database(e.to_string())
}

fn subnet_from_row(value: i32) -> Result<SubnetId> {
    SubnetId::try_from(value).map_err(|_| Error::Parse(format!("subnet id {value} out of range")))
}

/// SQLite-backed [`HistoryStore`].
pub struct SqliteHistory {
    pool: DbPool,
}

impl SqliteHistory {
    /// Create a history store on an already migrated pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn dividend_row(record: &DividendRecord) -> Result<NewDividendRow> {
        Ok(NewDividendRow {
            subnet_id: i32::from(record.subnet_id),
            account_id: record.account_id.clone(),
            value: i64::try_from(record.value).map_err(|_| {
                Error::Parse(format!("dividend {} exceeds storage range", record.value))
            })?,
            observed_at: format_timestamp(record.observed_at),
        })
    }

    fn dividend_from_row(row: DividendRow) -> Result<DividendRecord> {
        Ok(DividendRecord {
            subnet_id: subnet_from_row(row.subnet_id)?,
            account_id: row.account_id,
            value: u64::try_from(row.value)
                .map_err(|_| Error::Parse(format!("negative dividend {}", row.value)))?,
            observed_at: parse_timestamp(&row.observed_at)?,
        })
    }

    fn outcome_row(outcome: &TradeOutcome) -> NewOutcomeRow {
        NewOutcomeRow {
            job_id: outcome.job_id.to_string(),
            subnet_id: i32::from(outcome.subnet_id),
            account_id: outcome.account_id.clone(),
            sentiment_score: outcome.sentiment_score,
            action: outcome.action.as_str().to_string(),
            magnitude: outcome.magnitude.to_string(),
            status: outcome.status.as_str().to_string(),
            error_detail: outcome.error_detail.clone(),
            tx_hash: outcome.tx_hash.clone(),
            completed_at: format_timestamp(outcome.completed_at),
        }
    }

    fn outcome_from_row(row: OutcomeRow) -> Result<TradeOutcome> {
        Ok(TradeOutcome {
            job_id: JobId::from(row.job_id),
            subnet_id: subnet_from_row(row.subnet_id)?,
            account_id: row.account_id,
            sentiment_score: row.sentiment_score,
            action: TradeAction::from_str(&row.action).map_err(Error::Parse)?,
            magnitude: Decimal::from_str(&row.magnitude).map_err(|e| Error::Parse(e.to_string()))?,
            status: OutcomeStatus::from_str(&row.status).map_err(Error::Parse)?,
            error_detail: row.error_detail,
            tx_hash: row.tx_hash,
            completed_at: parse_timestamp(&row.completed_at)?,
        })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn append(&self, record: &HistoryRecord) -> Result<Appended> {
        match record {
            HistoryRecord::Dividends(records) if records.is_empty() => Ok(Appended::Written),
            HistoryRecord::Dividends(records) => {
                let rows = records
                    .iter()
                    .map(Self::dividend_row)
                    .collect::<Result<Vec<_>>>()?;
                interact(&self.pool, move |conn| {
                    conn.transaction(|conn| {
                        diesel::insert_into(dividends::table)
                            .values(&rows)
                            .execute(conn)
                    })
                    .map_err(db_err)?;
                    Ok(Appended::Written)
                })
                .await
            }
            HistoryRecord::Outcome(outcome) => {
                let row = Self::outcome_row(outcome);
                interact(&self.pool, move |conn| {
                    let inserted = diesel::insert_or_ignore_into(trade_outcomes::table)
                        .values(&row)
                        .execute(conn)
                        .map_err(db_err)?;
                    Ok(if inserted == 0 {
                        Appended::AlreadyRecorded
                    } else {
                        Appended::Written
                    })
                })
                .await
            }
        }
    }

    async fn outcome(&self, job_id: &JobId) -> Result<Option<TradeOutcome>> {
        let id = job_id.to_string();
        let row = interact(&self.pool, move |conn| {
            trade_outcomes::table
                .filter(trade_outcomes::job_id.eq(id))
                .select(OutcomeRow::as_select())
                .first::<OutcomeRow>(conn)
                .optional()
                .map_err(db_err)
        })
        .await?;
        row.map(Self::outcome_from_row).transpose()
    }

    async fn exists_outcome(&self, job_id: &JobId) -> Result<bool> {
        let id = job_id.to_string();
        interact(&self.pool, move |conn| {
            let count: i64 = trade_outcomes::table
                .filter(trade_outcomes::job_id.eq(id))
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            Ok(count > 0)
        })
        .await
    }

    async fn begin_execution(&self, job_id: &JobId, attempt: u32) -> Result<ExecutionIntent> {
        let row = IntentRow {
            job_id: job_id.to_string(),
            started_at: format_timestamp(Utc::now()),
            attempt: i32::try_from(attempt).unwrap_or(i32::MAX),
        };
        let held = interact(&self.pool, move |conn| {
            conn.transaction(|conn| {
                let inserted = diesel::insert_or_ignore_into(execution_intents::table)
                    .values(&row)
                    .execute(conn)?;
                if inserted == 1 {
                    return Ok(None);
                }
                execution_intents::table
                    .filter(execution_intents::job_id.eq(&row.job_id))
                    .select(IntentRow::as_select())
                    .first::<IntentRow>(conn)
                    .map(Some)
            })
            .map_err(db_err)
        })
        .await?;

        match held {
            None => Ok(ExecutionIntent::Began),
            Some(row) => Ok(ExecutionIntent::Held {
                attempt: u32::try_from(row.attempt).unwrap_or_default(),
                started_at: parse_timestamp(&row.started_at)?,
            }),
        }
    }

    async fn recent_outcomes(&self, limit: usize) -> Result<Vec<TradeOutcome>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = interact(&self.pool, move |conn| {
            trade_outcomes::table
                .order(trade_outcomes::id.desc())
                .limit(limit)
                .select(OutcomeRow::as_select())
                .load::<OutcomeRow>(conn)
                .map_err(db_err)
        })
        .await?;
        rows.into_iter().map(Self::outcome_from_row).collect()
    }

    async fn recent_dividends(&self, key: &QueryKey, limit: usize) -> Result<Vec<DividendRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let subnet = key.subnet_id().map(i32::from);
        let account = key.account_id().map(str::to_string);
        let rows = interact(&self.pool, move |conn| {
            let mut query = dividends::table.into_boxed();
            if let Some(subnet) = subnet {
                query = query.filter(dividends::subnet_id.eq(subnet));
            }
            if let Some(account) = account {
                query = query.filter(dividends::account_id.eq(account));
            }
            query
                .order(dividends::id.desc())
                .limit(limit)
                .select(DividendRow::as_select())
                .load::<DividendRow>(conn)
                .map_err(db_err)
        })
        .await?;
        rows.into_iter().map(Self::dividend_from_row).collect()
    }
}
