//! Infrastructure configuration modules.

pub mod cache;
pub mod llm;
pub mod logging;
pub mod sentiment;
pub mod settings;
pub mod trading;
pub mod upstream;

pub use settings::Config;
