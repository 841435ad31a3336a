//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - Driving side: the operator CLI
//! - [`outbound`] - Driven side: caches, queues, storage and external APIs

pub mod inbound;
pub mod outbound;
