//! Inbound (driving) ports consumed by inbound adapters.
//!
//! # Modules
//!
//! - [`query`]: Dividend reads, uncached reads and cache purges

pub mod query;
