//! Sentiment scores derived from social posts about a subnet.

use serde::{Deserialize, Serialize};

/// Bounded sentiment signal in `[-100, 100]`.
///
/// The inner value is private so every score goes through clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SentimentScore(i32);

impl SentimentScore {
    pub const MIN: i32 = -100;
    pub const MAX: i32 = 100;

    /// Create a score, clamping into range.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Create a score from a raw model output, clamping and rounding.
    ///
    /// Returns `None` for NaN or infinite input.
    #[must_use]
    pub fn from_raw(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let clamped = value.clamp(f64::from(Self::MIN), f64::from(Self::MAX));
        Some(Self(clamped.round() as i32))
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn is_neutral(self) -> bool {
        self.0 == 0
    }
}

/// What a sentiment analyzer produced for a subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Score(SentimentScore),
    /// Nothing to analyze (no posts found, or none with text).
    NoData,
}

/// A social post returned by tweet search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Tweet {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: Some(text.into()),
        }
    }

    /// Trimmed, non-empty text if the post has any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
