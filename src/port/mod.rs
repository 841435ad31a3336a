//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (caches, chain gateways, sentiment providers, queues, storage).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!        CLI ───────▶│      Application        │
//!                    │  Domain + Port          │
//!                    └─────────────────────────┘
//!                      │        │           │
//!                      ▼        ▼           ▼
//!                 ┌───────┐ ┌────────┐ ┌──────────┐
//!                 │ Cache │ │ Queue  │ │ Chain /  │
//!                 │       │ │History │ │ Sentiment│
//!                 └───────┘ └────────┘ └──────────┘
//! ```
//!
//! - [`inbound`]: use cases driven by the CLI and transport layer
//! - [`outbound`]: infrastructure the application depends on

pub mod inbound;
pub mod outbound;
