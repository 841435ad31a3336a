//! Stake changes through the chain gateway.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::GatewayClient;
use crate::domain::{SubnetId, TradeAction};
use crate::error::{Error, Result};
use crate::port::outbound::executor::{ExecutionReceipt, TradeExecutor, TradeOrder};

/// Rao per TAO.
pub const RAO_PER_TAO: u64 = 1_000_000_000;

/// Convert a TAO amount to whole rao, truncating sub-rao dust.
///
/// # Errors
///
/// Returns [`Error::Executor`] for negative or out-of-range amounts.
pub fn tao_to_rao(tao: Decimal) -> Result<u64> {
    (tao * Decimal::from(RAO_PER_TAO))
        .trunc()
        .to_u64()
        .ok_or_else(|| Error::Executor(format!("amount {tao} TAO is not representable in rao")))
}

#[derive(Debug, Serialize)]
struct StakeRequest<'a> {
    netuid: SubnetId,
    hotkey: &'a str,
    amount_rao: u64,
    /// Lets the gateway drop repeated submissions of the same job.
    idempotency_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct StakeResponse {
    success: bool,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`TradeExecutor`] backed by `POST /stake` and `POST /unstake`.
pub struct GatewayExecutor {
    client: GatewayClient,
}

impl GatewayExecutor {
    #[must_use]
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

fn receipt_from(response: StakeResponse) -> Result<ExecutionReceipt> {
    if response.success {
        Ok(ExecutionReceipt {
            tx_hash: response.hash,
        })
    } else {
        Err(Error::Executor(
            response.error.unwrap_or_else(|| "gateway rejected the request".into()),
        ))
    }
}

#[async_trait]
impl TradeExecutor for GatewayExecutor {
    fn name(&self) -> &'static str {
        "gateway"
    }

    async fn execute(&self, order: &TradeOrder) -> Result<ExecutionReceipt> {
        let path = match order.action {
            TradeAction::Stake => "stake",
            TradeAction::Unstake => "unstake",
            TradeAction::None => return Err(Error::Executor("no action to execute".into())),
        };
        let request = StakeRequest {
            netuid: order.subnet_id,
            hotkey: &order.account_id,
            amount_rao: tao_to_rao(order.magnitude)?,
            idempotency_key: order.job_id.as_str(),
        };

        let response = self
            .client
            .post(self.client.endpoint(path)?)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Executor(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Executor(e.to_string()))?
            .json::<StakeResponse>()
            .await
            .map_err(|e| Error::Executor(format!("malformed gateway response: {e}")))?;

        let receipt = receipt_from(response)?;
        info!(
            job_id = %order.job_id,
            action = path,
            amount_rao = request.amount_rao,
            tx_hash = receipt.tx_hash.as_deref().unwrap_or("-"),
            "Stake change submitted"
        );
        Ok(receipt)
    }
}
