//! Asynchronous trade pipeline: job construction, execution and workers.
//!
//! - [`JobFactory`] - deterministic job ids per request window
//! - [`TradeWorker`] - one delivery to one recorded outcome
//! - [`WorkerPool`] - concurrent consumers of the dispatcher

mod job;
mod pool;
mod worker;

pub use job::JobFactory;
pub use pool::{PoolReport, WorkerPool};
pub use worker::{Processed, TradeWorker, WorkerSettings, UNKNOWN_EXECUTION};
