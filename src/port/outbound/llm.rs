//! LLM completion port used for sentiment scoring.
//!
//! Defines a generic interface for large language model completion requests.

use async_trait::async_trait;

use crate::error::Result;

/// Client for large language model text completion.
///
/// Implementations wrap specific LLM providers (Chutes, OpenAI, Anthropic)
/// and handle authentication and response parsing.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) to support concurrent
/// scoring from several workers.
///
/// # Errors
///
/// The [`complete`](Self::complete) method returns an error for API failures,
/// rate limits, or invalid responses.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Return the provider name for logging.
    fn name(&self) -> &'static str;

    /// Send a completion request and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
