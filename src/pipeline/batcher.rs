use std::sync::Arc;
use tracing::{debug, error};

use crate::completion::{parse_labels, ChatMessage, Completions};
use crate::models::{Article, Sentiment};
use crate::stats::RunStats;

const MAX_MARKET_TITLE_CHARS: usize = 120;
const MAX_ARTICLE_TITLE_CHARS: usize = 160;
const MAX_SUMMARY_CHARS: usize = 300;

pub struct ArticleClassifier {
    client: Arc<dyn Completions>,
    chunk_size: usize,
    max_tokens: u32,
}

impl ArticleClassifier {
    pub fn new(client: Arc<dyn Completions>, chunk_size: usize, max_tokens: u32) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
            max_tokens,
        }
    }

    /// Classify every article against the market, preserving input order.
    /// Always returns exactly one label per article: a failed chunk degrades
    /// to all-neutral and later chunks still run.
    pub async fn classify(
        &self,
        articles: &[Article],
        market_title: &str,
        stats: &RunStats,
    ) -> Vec<Sentiment> {
        let mut labels = Vec::with_capacity(articles.len());

        // Chunks run sequentially to bound in-flight requests per market
        for chunk in articles.chunks(self.chunk_size) {
            let messages = build_prompt(market_title, chunk);

            match self.client.submit(&messages, self.max_tokens).await {
                Ok(text) => {
                    let parsed = parse_labels(&text, chunk.len());
                    for i in 0..chunk.len() {
                        labels.push(parsed.get(i).copied().unwrap_or(Sentiment::Neutral));
                    }
                }
                Err(e) => {
                    error!(
                        "Classification failed for a batch of {} articles in \"{}\": {}",
                        chunk.len(),
                        market_title,
                        e
                    );
                    stats.record_error();
                    labels.extend(std::iter::repeat(Sentiment::Neutral).take(chunk.len()));
                }
            }
        }

        debug!(
            "Classified {} articles for \"{}\"",
            labels.len(),
            market_title
        );
        labels
    }
}

fn build_prompt(market_title: &str, articles: &[Article]) -> Vec<ChatMessage> {
    let mut list = String::new();
    for (i, article) in articles.iter().enumerate() {
        list.push_str(&format!(
            "{}. {}",
            i + 1,
            truncate(&article.title, MAX_ARTICLE_TITLE_CHARS)
        ));
        if let Some(summary) = &article.summary {
            list.push_str(": ");
            list.push_str(&truncate(summary, MAX_SUMMARY_CHARS));
        }
        list.push('\n');
    }

    let user = format!(
        "Market: {}\n\n\
        Classify each numbered article as \"bullish\", \"bearish\" or \"neutral\" \
        depending on whether it supports a YES resolution of the market.\n\n\
        {}\n\
        Respond with only a JSON array of {} labels in the same order, \
        e.g. [\"bullish\",\"neutral\"].",
        truncate(market_title, MAX_MARKET_TITLE_CHARS),
        list,
        articles.len()
    );

    vec![
        ChatMessage::system(
            "You classify news articles for prediction markets. \
            Respond only with a JSON array of sentiment labels.",
        ),
        ChatMessage::user(user),
    ]
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
