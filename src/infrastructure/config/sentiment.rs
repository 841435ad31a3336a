//! Tweet search settings for sentiment scoring.

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::datura::DEFAULT_SEARCH_URL;
use crate::application::sentiment::SentimentSettings;

/// Tweet search settings. The API key comes from `DATURA_API_KEY`.
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Posts requested per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Prompt length cap; longer tweet text is truncated.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Bound on one search request (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SentimentConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn settings(&self) -> SentimentSettings {
        SentimentSettings {
            max_results: self.max_results,
            max_prompt_chars: self.max_prompt_chars,
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            max_results: default_max_results(),
            max_prompt_chars: default_max_prompt_chars(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.into()
}

const fn default_max_results() -> usize {
    20
}

const fn default_max_prompt_chars() -> usize {
    8_000
}

const fn default_timeout_ms() -> u64 {
    15_000
}
