//! Infrastructure layer.
//!
//! Configuration loading and the composition root that wires adapters into
//! the application services. No business logic lives here.
//!
//! - [`bootstrap`] - Builds the component graph from configuration
//! - [`config`] - Configuration loading and validation

pub mod bootstrap;
pub mod config;
