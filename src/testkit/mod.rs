//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`quote`] - `ScriptedQuoteSource`: counted, optionally slow upstream.
//! - [`trade`] - `ScriptedAnalyzer` and `RecordingExecutor`.
//! - [`unavailable`] - Adapters that always fail or hang, for degradation tests.
//! - [`domain`] - Builders for records, jobs and deliveries.

pub mod domain;
pub mod quote;
pub mod trade;
pub mod unavailable;
