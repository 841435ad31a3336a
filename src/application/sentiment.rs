//! Sentiment scoring from recent posts about a subnet.
//!
//! [`LlmSentimentAnalyzer`] searches for posts, asks an LLM for one number
//! in `[-100, 100]` and parses it into a [`SentimentScore`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::{Sentiment, SentimentScore, SubnetId};
use crate::error::{Error, Result};
use crate::port::outbound::llm::Llm;
use crate::port::outbound::sentiment::{SentimentAnalyzer, TweetSearch};

/// Search and prompt sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentSettings {
    pub max_results: usize,
    pub max_prompt_chars: usize,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            max_results: 20,
            max_prompt_chars: 8000,
        }
    }
}

/// Tweet search plus LLM scoring.
pub struct LlmSentimentAnalyzer {
    search: Arc<dyn TweetSearch>,
    llm: Arc<dyn Llm>,
    settings: SentimentSettings,
}

impl LlmSentimentAnalyzer {
    pub fn new(search: Arc<dyn TweetSearch>, llm: Arc<dyn Llm>, settings: SentimentSettings) -> Self {
        Self {
            search,
            llm,
            settings,
        }
    }
}

/// Search query used to find posts about a subnet.
#[must_use]
pub fn search_query(subnet_id: SubnetId) -> String {
    format!("Bittensor netuid {subnet_id}")
}

/// Build the scoring prompt from post texts, keeping at most
/// `max_chars` characters of post content.
#[must_use]
pub fn build_prompt(texts: &[&str], max_chars: usize) -> String {
    let joined = texts.join("\n");
    let body = if joined.chars().count() > max_chars {
        let mut cut: String = joined.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        joined
    };

    format!(
        "Analyze the sentiment of the following tweets about Bittensor. \
         Rate the overall sentiment on a scale from -100 (extremely negative) \
         to +100 (extremely positive), where 0 is neutral.\n\n\
         Return ONLY a number between -100 and +100 indicating the sentiment score.\n\n\
         Tweets:\n{body}\n\nSentiment score:"
    )
}

/// Extract a score from model output.
///
/// Accepts a bare number, optionally with thousands separators or
/// surrounding text such as `"Score: 42."`. Returns `None` if no number is
/// present.
#[must_use]
pub fn parse_score(output: &str) -> Option<SentimentScore> {
    let cleaned = output.replace(',', "");
    let trimmed = cleaned.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return SentimentScore::from_raw(value);
    }

    let start = trimmed.find(|c: char| c.is_ascii_digit() || c == '-' || c == '+')?;
    let rest = &trimmed[start..];
    let end = rest
        .char_indices()
        .skip(1)
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map_or(rest.len(), |(i, _)| i);
    rest[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .and_then(SentimentScore::from_raw)
}

#[async_trait]
impl SentimentAnalyzer for LlmSentimentAnalyzer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn score(&self, subnet_id: SubnetId) -> Result<Sentiment> {
        let query = search_query(subnet_id);
        let tweets = self
            .search
            .search(&query, self.settings.max_results)
            .await
            .map_err(|e| Error::Analyzer(format!("{} search: {e}", self.search.name())))?;

        let texts: Vec<&str> = tweets.iter().filter_map(|t| t.body()).collect();
        if texts.is_empty() {
            info!(subnet_id, found = tweets.len(), "No tweet text to analyze");
            return Ok(Sentiment::NoData);
        }

        let prompt = build_prompt(&texts, self.settings.max_prompt_chars);
        let output = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| Error::Analyzer(format!("{} completion: {e}", self.llm.name())))?;

        let score = parse_score(&output).ok_or_else(|| {
            Error::Analyzer(format!("could not parse a score from '{}'", output.trim()))
        })?;
        debug!(subnet_id, tweets = texts.len(), score = score.value(), "Scored sentiment");
        Ok(Sentiment::Score(score))
    }
}
