//! Application layer: use cases composed from domain types and ports.
//!
//! - [`query`] - Cache-aside dividend reads with single-flight fetches
//! - [`trade`] - Trade job construction, idempotent execution and workers
//! - [`sentiment`] - Tweet search plus LLM sentiment scoring
//! - [`retry`] - Exponential backoff with per-attempt timeouts

pub mod query;
pub mod retry;
pub mod sentiment;
pub mod trade;
