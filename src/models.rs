use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentiment of a news article relative to a "yes" resolution of its market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Map a free-form label to a sentiment, case-insensitively.
    /// Anything unrecognized is neutral.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "bullish" => Sentiment::Bullish,
            "bearish" => Sentiment::Bearish,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub sentiment: Sentiment,
}

/// Denormalized index of article references across all markets.
/// Articles here duplicate the per-market files and carry their own sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateIndex {
    pub markets: BTreeMap<String, Vec<Article>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Outcome of reconciling a single market file.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    pub market_id: String,
    pub articles: Vec<Article>,
    pub changed: bool,
}

impl ReconcileResult {
    /// Empty result for files that were unreadable or held no articles.
    pub fn unchanged(market_id: impl Into<String>) -> Self {
        Self {
            market_id: market_id.into(),
            articles: Vec::new(),
            changed: false,
        }
    }
}
