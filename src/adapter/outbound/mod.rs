//! Outbound adapters (driven side).

pub mod datura;
pub mod gateway;
pub mod llm;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod simulated;
pub mod sqlite;
