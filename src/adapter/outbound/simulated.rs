//! Offline stand-ins for the chain: a slow fixed-value dividend source and
//! an executor that only logs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::domain::{DividendRecord, Dividends, QueryKey, SubnetId};
use crate::error::Result;
use crate::port::outbound::executor::{ExecutionReceipt, TradeExecutor, TradeOrder};
use crate::port::outbound::quote::UpstreamQuoteSource;

/// Dividend source that waits `latency` and returns `dividend` for every
/// account.
///
/// Wildcard queries resolve against the configured default subnet and
/// account, so the aggregate result always has one record.
pub struct SimulatedQuoteSource {
    latency: Duration,
    dividend: u64,
    default_subnet: SubnetId,
    default_account: String,
}

impl SimulatedQuoteSource {
    pub fn new(
        latency: Duration,
        dividend: u64,
        default_subnet: SubnetId,
        default_account: impl Into<String>,
    ) -> Self {
        Self {
            latency,
            dividend,
            default_subnet,
            default_account: default_account.into(),
        }
    }
}

#[async_trait]
impl UpstreamQuoteSource for SimulatedQuoteSource {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn fetch(&self, key: &QueryKey) -> Result<Dividends> {
        tokio::time::sleep(self.latency).await;
        let record = DividendRecord::new(
            key.subnet_id().unwrap_or(self.default_subnet),
            key.account_id().unwrap_or(&self.default_account),
            self.dividend,
            Utc::now(),
        );
        Ok(if key.is_aggregate() {
            Dividends::Aggregate(vec![record])
        } else {
            Dividends::Single(record)
        })
    }
}

/// Executor for dry runs: logs the order and reports success without a
/// transaction hash.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl TradeExecutor for DryRunExecutor {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn execute(&self, order: &TradeOrder) -> Result<ExecutionReceipt> {
        info!(
            job_id = %order.job_id,
            subnet_id = order.subnet_id,
            account_id = %order.account_id,
            action = %order.action,
            magnitude = %order.magnitude,
            "Dry run: stake change not submitted"
        );
        Ok(ExecutionReceipt::default())
    }
}
