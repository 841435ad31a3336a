//! Dividend reads through the chain gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::client::GatewayClient;
use crate::domain::{DividendRecord, Dividends, QueryKey, SubnetId};
use crate::error::{Error, Result};
use crate::port::outbound::quote::UpstreamQuoteSource;

/// Wire shape of one dividend entry.
#[derive(Debug, Deserialize)]
struct DividendDto {
    netuid: SubnetId,
    hotkey: String,
    /// Rao; fractional or negative values are malformed.
    dividend: serde_json::Number,
    #[serde(default)]
    observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DividendsDto {
    dividends: Vec<DividendDto>,
}

impl DividendDto {
    fn into_record(self, fetched_at: DateTime<Utc>) -> Result<DividendRecord> {
        let value = self.dividend.as_u64().ok_or_else(|| {
            Error::Upstream(format!(
                "dividend for netuid {} hotkey {} is not a whole rao amount: {}",
                self.netuid, self.hotkey, self.dividend
            ))
        })?;
        Ok(DividendRecord::new(
            self.netuid,
            self.hotkey,
            value,
            self.observed_at.unwrap_or(fetched_at),
        ))
    }
}

/// Shape the gateway's list into the result `key` expects.
fn shape(key: &QueryKey, dto: DividendsDto, fetched_at: DateTime<Utc>) -> Result<Dividends> {
    let mut records = dto
        .dividends
        .into_iter()
        .map(|d| d.into_record(fetched_at))
        .collect::<Result<Vec<_>>>()?;

    let dividends = if key.is_aggregate() {
        Dividends::Aggregate(records)
    } else {
        match records.len() {
            1 => Dividends::Single(records.remove(0)),
            n => return Err(Error::Upstream(format!("expected one record for {key}, got {n}"))),
        }
    };
    dividends.validate_for(key).map_err(Error::Upstream)?;
    Ok(dividends)
}

/// [`UpstreamQuoteSource`] backed by `GET /dividends`.
pub struct GatewayQuoteSource {
    client: GatewayClient,
}

impl GatewayQuoteSource {
    #[must_use]
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpstreamQuoteSource for GatewayQuoteSource {
    fn name(&self) -> &'static str {
        "gateway"
    }

    async fn fetch(&self, key: &QueryKey) -> Result<Dividends> {
        let mut url = self.client.endpoint("dividends")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(subnet) = key.subnet_id() {
                query.append_pair("netuid", &subnet.to_string());
            }
            if let Some(account) = key.account_id() {
                query.append_pair("hotkey", account);
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        let dto = response
            .json::<DividendsDto>()
            .await
            .map_err(|e| Error::Upstream(format!("malformed dividends payload: {e}")))?;

        shape(key, dto, Utc::now())
    }
}
