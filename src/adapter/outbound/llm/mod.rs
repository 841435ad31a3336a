//! LLM adapter modules.
//!
//! Provides implementations of the [`Llm`](crate::port::outbound::llm::Llm) trait
//! for Chutes, Anthropic Claude and OpenAI.

pub mod anthropic;
pub mod chutes;
pub mod openai;

pub use anthropic::Anthropic;
pub use chutes::Chutes;
pub use openai::OpenAi;
