//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{dividends, execution_intents, trade_jobs, trade_outcomes};

/// Database row for a dividend observation (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = dividends)]
pub struct NewDividendRow {
    pub subnet_id: i32,
    pub account_id: String,
    pub value: i64,
    pub observed_at: String,
}

/// Database row for a dividend observation (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = dividends)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DividendRow {
    pub id: Option<i32>,
    pub subnet_id: i32,
    pub account_id: String,
    pub value: i64,
    pub observed_at: String,
}

/// Database row for a trade outcome (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = trade_outcomes)]
pub struct NewOutcomeRow {
    pub job_id: String,
    pub subnet_id: i32,
    pub account_id: String,
    pub sentiment_score: Option<i32>,
    pub action: String,
    pub magnitude: String,
    pub status: String,
    pub error_detail: Option<String>,
    pub tx_hash: Option<String>,
    pub completed_at: String,
}

/// Database row for a trade outcome (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = trade_outcomes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutcomeRow {
    pub id: Option<i32>,
    pub job_id: String,
    pub subnet_id: i32,
    pub account_id: String,
    pub sentiment_score: Option<i32>,
    pub action: String,
    pub magnitude: String,
    pub status: String,
    pub error_detail: Option<String>,
    pub tx_hash: Option<String>,
    pub completed_at: String,
}

/// Database row for an execution intent.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = execution_intents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IntentRow {
    pub job_id: String,
    pub started_at: String,
    /// Delivery attempt that journalled the intent.
    pub attempt: i32,
}

/// Database row for a queued trade job (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = trade_jobs)]
pub struct NewTradeJobRow {
    pub job_id: String,
    pub subnet_id: i32,
    pub account_id: String,
    pub requested_at: String,
    pub state: String,
    pub attempts: i32,
    pub visible_at: String,
}

/// Database row for a queued trade job (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = trade_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeJobRow {
    pub id: Option<i32>,
    pub job_id: String,
    pub subnet_id: i32,
    pub account_id: String,
    pub requested_at: String,
    pub state: String,
    pub attempts: i32,
    pub visible_at: String,
}
