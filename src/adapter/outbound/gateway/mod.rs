//! Chain gateway adapters.
//!
//! The gateway is an HTTP service in front of the chain node. Dividend reads
//! use `GET /dividends?netuid=&hotkey=`; stake changes use `POST /stake` and
//! `POST /unstake` with amounts in rao.

mod client;
mod executor;
mod quote;

pub use client::GatewayClient;
pub use executor::{tao_to_rao, GatewayExecutor, RAO_PER_TAO};
pub use quote::GatewayQuoteSource;
