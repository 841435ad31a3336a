//! taodiv - cached subnet dividend queries with sentiment-driven staking.
//!
//! Answers "what is the current dividend for this subnet/account" under
//! heavy concurrent load, and optionally queues a stake change driven by
//! social sentiment about the subnet.
//!
//! # Architecture
//!
//! The crate is laid out as ports and adapters:
//!
//! - **Read path** - [`application::query::DividendQueryService`] serves
//!   results from a TTL cache and coalesces concurrent misses for the same
//!   key into one upstream fetch.
//! - **Trade path** - a query with `trade = true` enqueues a
//!   [`domain::TradeJob`] whose id is stable for one request window.
//!   [`application::trade::WorkerPool`] drains the queue; each job is scored,
//!   executed at most once and recorded exactly once before it is acked.
//!
//! # Modules
//!
//! - [`domain`] - Query keys, dividend records, trade jobs and outcomes
//! - [`port`] - Inbound use cases and outbound collaborator traits
//! - [`application`] - Query service, single-flight, retry, trade worker
//! - [`adapter`] - Memory, Redis, SQLite, HTTP and CLI adapters
//! - [`infrastructure`] - Configuration and component wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `redis` (default) - Shared Redis cache backend
//! - `testkit` - Scripted fakes of every outbound port for integration tests
//!
//! # Example
//!
//! ```no_run
//! use taodiv::infrastructure::bootstrap::{build_query_service, Components};
//! use taodiv::infrastructure::config::Config;
//! use taodiv::port::inbound::query::{DividendQuery, QueryRequest};
//!
//! # async fn demo() -> taodiv::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let components = Components::connect(&config)?;
//! let service = build_query_service(&config, &components)?;
//! let response = service
//!     .query(QueryRequest::new(Some(18), None).with_trade(true))
//!     .await?;
//! println!("cached={} trade_enqueued={}", response.cached, response.trade_enqueued);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
