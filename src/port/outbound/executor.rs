//! Stake/unstake execution port.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{JobId, SubnetId, TradeAction};
use crate::error::Result;

/// A stake change to submit on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOrder {
    pub job_id: JobId,
    pub subnet_id: SubnetId,
    pub account_id: String,
    pub action: TradeAction,
    /// Amount in TAO.
    pub magnitude: Decimal,
}

/// What the executor reported for an accepted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReceipt {
    pub tx_hash: Option<String>,
}

/// Submits stake changes on chain.
///
/// There is no read-back operation: once `execute` returns an error the
/// caller cannot tell whether the chain applied the change.
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Return the executor name for logging.
    fn name(&self) -> &'static str;

    /// Submit `order`. Rejections are [`Error::Executor`](crate::error::Error::Executor).
    async fn execute(&self, order: &TradeOrder) -> Result<ExecutionReceipt>;
}
