//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: the dividend cache,
//! the upstream chain query, sentiment sources, the trade executor, the job
//! queue and the history log.

pub mod cache;
pub mod dispatch;
pub mod executor;
pub mod history;
pub mod llm;
pub mod quote;
pub mod sentiment;
