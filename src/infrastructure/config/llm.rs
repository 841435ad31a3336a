//! LLM provider configuration.
//!
//! Configures the model that turns tweets into a sentiment score. API keys
//! are read from the environment at startup (`CHUTES_API_KEY`,
//! `ANTHROPIC_API_KEY` or `OPENAI_API_KEY`).

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::llm::chutes::DEFAULT_ENDPOINT;

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Provider used for scoring. Defaults to Chutes.
    #[serde(default)]
    pub provider: LlmProvider,

    /// Bound on one completion request (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub chutes: ChutesConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,
}

impl LlmConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            timeout_ms: default_timeout_ms(),
            chutes: ChutesConfig::default(),
            anthropic: AnthropicConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

/// LLM provider selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Hosted sentiment model on Chutes.
    #[default]
    Chutes,
    /// Anthropic Claude models.
    Anthropic,
    /// OpenAI GPT models.
    OpenAi,
}

/// Chutes-specific settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChutesConfig {
    #[serde(default = "default_chutes_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

impl Default for ChutesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chutes_endpoint(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

/// Anthropic-specific settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicConfig {
    /// Defaults to "claude-3-5-haiku-20241022".
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// A score needs only a few tokens. Defaults to 16.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: default_anthropic_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// OpenAI-specific settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Defaults to "gpt-4o-mini".
    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: default_openai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_chutes_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-20241022".into()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_top_p() -> f64 {
    0.9
}

const fn default_max_tokens() -> usize {
    16
}

const fn default_timeout_ms() -> u64 {
    30_000
}
