//! Handlers for `history` subcommands.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::{DividendHistoryArgs, LimitArgs};
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::SqliteHistory;
use crate::domain::{DividendRecord, OutcomeStatus, TradeOutcome};
use crate::error::Result;
use crate::infrastructure::bootstrap::open_database;
use crate::infrastructure::config::Config;
use crate::port::outbound::history::HistoryStore;

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Completed")]
    completed: String,
    #[tabled(rename = "Netuid")]
    subnet: u16,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "TAO")]
    magnitude: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&TradeOutcome> for OutcomeRow {
    fn from(outcome: &TradeOutcome) -> Self {
        let detail = match outcome.status {
            OutcomeStatus::Success => outcome.tx_hash.clone().unwrap_or_default(),
            _ => outcome.error_detail.clone().unwrap_or_default(),
        };
        Self {
            completed: outcome.completed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            subnet: outcome.subnet_id,
            score: outcome
                .sentiment_score
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            action: outcome.action.to_string(),
            magnitude: outcome.magnitude.to_string(),
            status: outcome.status.to_string(),
            detail,
        }
    }
}

#[derive(Tabled)]
struct DividendRow {
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Netuid")]
    subnet: u16,
    #[tabled(rename = "Hotkey")]
    account: String,
    #[tabled(rename = "Dividend (rao)")]
    value: u64,
}

impl From<&DividendRecord> for DividendRow {
    fn from(record: &DividendRecord) -> Self {
        Self {
            observed: record.observed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            subnet: record.subnet_id,
            account: record.account_id.clone(),
            value: record.value,
        }
    }
}

fn open_history(config: &Config) -> Result<SqliteHistory> {
    Ok(SqliteHistory::new(open_database(config)?))
}

/// Show the most recent trade outcomes.
pub async fn outcomes(config: &Config, args: &LimitArgs) -> Result<()> {
    let outcomes = open_history(config)?.recent_outcomes(args.limit).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "history.outcomes",
            "outcomes": outcomes,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::section("Trade outcomes");
    if outcomes.is_empty() {
        output::hint("no trades recorded yet; run `taodiv query --trade` and `taodiv worker`");
        return Ok(());
    }
    let rows: Vec<OutcomeRow> = outcomes.iter().map(OutcomeRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

/// Show the most recent dividend observations in scope.
pub async fn dividends(config: &Config, args: &DividendHistoryArgs) -> Result<()> {
    let key = args.scope.key();
    let records = open_history(config)?
        .recent_dividends(&key, args.limit.limit)
        .await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "history.dividends",
            "key": key.to_string(),
            "dividends": records,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::section(&format!("Dividend observations ({key})"));
    if records.is_empty() {
        output::hint("no observations recorded for this scope");
        return Ok(());
    }
    let rows: Vec<DividendRow> = records.iter().map(DividendRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
