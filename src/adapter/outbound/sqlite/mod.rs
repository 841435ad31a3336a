//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed history log and durable trade job queue
//! using Diesel ORM.

pub mod database;
mod dispatch;
mod history;

pub use dispatch::SqliteDispatcher;
pub use history::SqliteHistory;
