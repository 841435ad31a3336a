//! Upstream dividend source and request defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::SubnetId;

/// Which dividend source to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// HTTP chain gateway.
    #[default]
    Gateway,
    /// Fixed value after a fixed delay, for local runs.
    Simulated,
}

/// Upstream source settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub source: QuoteSource,

    /// Base URL of the chain gateway. Also used for trade execution.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Bound on one upstream fetch (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,

    /// Dividend returned by the simulated source, in rao.
    #[serde(default = "default_simulated_dividend")]
    pub simulated_dividend: u64,

    /// Gateway bearer token, loaded from `GATEWAY_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl UpstreamConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            source: QuoteSource::default(),
            gateway_url: default_gateway_url(),
            timeout_ms: default_timeout_ms(),
            simulated_latency_ms: default_simulated_latency_ms(),
            simulated_dividend: default_simulated_dividend(),
            api_key: None,
        }
    }
}

/// Subnet and account used when a request leaves them out.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_subnet_id")]
    pub subnet_id: SubnetId,
    #[serde(default = "default_account_id")]
    pub account_id: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            subnet_id: default_subnet_id(),
            account_id: default_account_id(),
        }
    }
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8080/".into()
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_simulated_latency_ms() -> u64 {
    2_000
}

const fn default_simulated_dividend() -> u64 {
    12_345_678
}

const fn default_subnet_id() -> SubnetId {
    18
}

fn default_account_id() -> String {
    "5FFApaS75bv5pJHfAp2FVLBj9ZaXuFDjEypsaBNc1wCfe52v".into()
}
