use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::models::{Article, ReconcileResult, Sentiment};
use crate::pipeline::ArticleClassifier;
use crate::stats::RunStats;

// Market files are named like "will-btc-hit-100k-512034.json"; the trailing
// run of digits is an id, not part of the title.
static TRAILING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]\d+$").unwrap());

pub struct MarketReconciler {
    classifier: ArticleClassifier,
    dry_run: bool,
}

impl MarketReconciler {
    pub fn new(classifier: ArticleClassifier, dry_run: bool) -> Self {
        Self {
            classifier,
            dry_run,
        }
    }

    /// Re-derive labels for one market file and persist it if anything
    /// changed. Never fails: unreadable or empty files come back as empty
    /// unchanged results so one bad file cannot stop the run.
    pub async fn reconcile(&self, path: &Path, stats: &RunStats) -> ReconcileResult {
        let market_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut articles: Vec<Article> = match read_articles(path) {
            Ok(articles) => articles,
            Err(e) => {
                error!("Skipping {}: {}", path.display(), e);
                stats.record_error();
                return ReconcileResult::unchanged(market_id);
            }
        };
        if articles.is_empty() {
            debug!("No articles in {}, skipping", path.display());
            return ReconcileResult::unchanged(market_id);
        }

        let title = market_title_from_id(&market_id);
        let labels = self.classifier.classify(&articles, &title, stats).await;

        let mut changed = false;
        for (i, article) in articles.iter_mut().enumerate() {
            stats.record_article();
            let new_sentiment = labels.get(i).copied().unwrap_or(Sentiment::Neutral);
            if new_sentiment != article.sentiment {
                debug!(
                    "{}: \"{}\" {} -> {}",
                    market_id,
                    article.title,
                    article.sentiment.as_str(),
                    new_sentiment.as_str()
                );
                article.sentiment = new_sentiment;
                stats.record_change(new_sentiment);
                changed = true;
            }
        }
        stats.record_file();

        if changed && !self.dry_run {
            if let Err(e) = write_articles(path, &articles) {
                error!("Failed to write {}: {}", path.display(), e);
                stats.record_error();
            } else {
                info!("Updated {}", path.display());
            }
        }

        ReconcileResult {
            market_id,
            articles,
            changed,
        }
    }
}

fn read_articles(path: &Path) -> anyhow::Result<Vec<Article>> {
    let content = fs::read_to_string(path)?;
    let articles = serde_json::from_str(&content)?;
    Ok(articles)
}

fn write_articles(path: &Path, articles: &[Article]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(articles)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reconstruct a human-readable market question from a file stem, e.g.
/// "will-btc-hit-100k-512034" -> "Will Btc Hit 100k?". A heuristic stand-in
/// for the missing ground-truth title; the prompt quality depends on it.
pub fn market_title_from_id(market_id: &str) -> String {
    let base = TRAILING_ID.replace(market_id, "");
    let mut title = base
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    title.push('?');
    title
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
