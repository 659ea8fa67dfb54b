use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::models::{AggregateIndex, ReconcileResult, Sentiment};
use crate::stats::RunStats;

pub struct AggregateUpdater {
    path: PathBuf,
    dry_run: bool,
}

impl AggregateUpdater {
    pub fn new(path: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            path: path.into(),
            dry_run,
        }
    }

    /// Push the latest sentiments into the denormalized index. A missing or
    /// corrupt index abandons this step only; the per-market files were
    /// already persisted and must not be rolled back over it.
    pub async fn update(&self, results: &[ReconcileResult], stats: &RunStats) {
        // Last writer wins on colliding ids across markets; ids are globally
        // unique in practice.
        let mut lookup: HashMap<&str, Sentiment> = HashMap::new();
        for result in results {
            for article in &result.articles {
                lookup.insert(article.id.as_str(), article.sentiment);
            }
        }

        let mut index = match read_index(&self.path) {
            Ok(index) => index,
            Err(e) => {
                error!(
                    "Skipping aggregate update, could not read {}: {}",
                    self.path.display(),
                    e
                );
                stats.record_error();
                return;
            }
        };

        let mut updated = 0;
        for articles in index.markets.values_mut() {
            for article in articles.iter_mut() {
                if let Some(&sentiment) = lookup.get(article.id.as_str()) {
                    if sentiment != article.sentiment {
                        article.sentiment = sentiment;
                        stats.record_aggregate_update();
                        updated += 1;
                    }
                }
            }
        }

        index.updated_at = Utc::now();

        if self.dry_run {
            info!(
                "Dry run: {} aggregate references would be updated in {}",
                updated,
                self.path.display()
            );
            return;
        }

        match write_index(&self.path, &index) {
            Ok(()) => info!(
                "Aggregate index updated: {} references in {}",
                updated,
                self.path.display()
            ),
            Err(e) => {
                error!("Failed to write {}: {}", self.path.display(), e);
                stats.record_error();
            }
        }
    }
}

fn read_index(path: &Path) -> anyhow::Result<AggregateIndex> {
    let content = fs::read_to_string(path)?;
    let index = serde_json::from_str(&content)?;
    Ok(index)
}

fn write_index(path: &Path, index: &AggregateIndex) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(index)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use chrono::{DateTime, TimeZone};
    use tempfile::TempDir;

    fn article(id: &str, sentiment: Sentiment) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {}", id),
            summary: None,
            sentiment,
        }
    }

    fn seed_index(dir: &TempDir) -> PathBuf {
        let mut markets = std::collections::BTreeMap::new();
        markets.insert(
            "market-a".to_string(),
            vec![article("a1", Sentiment::Neutral), article("a2", Sentiment::Neutral)],
        );
        markets.insert("market-b".to_string(), vec![article("b1", Sentiment::Bullish)]);
        let index = AggregateIndex {
            markets,
            updated_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        };
        let path = dir.path().join("news_index.json");
        fs::write(&path, serde_json::to_string_pretty(&index).unwrap()).unwrap();
        path
    }

    fn result_with(articles: Vec<Article>) -> ReconcileResult {
        ReconcileResult {
            market_id: "market-a".to_string(),
            articles,
            changed: true,
        }
    }

    #[tokio::test]
    async fn only_matching_differing_ids_are_touched() {
        let dir = TempDir::new().unwrap();
        let path = seed_index(&dir);
        let stats = RunStats::new();

        let results = vec![result_with(vec![article("a1", Sentiment::Bearish)])];
        AggregateUpdater::new(&path, false).update(&results, &stats).await;

        let index = read_index(&path).unwrap();
        assert_eq!(index.markets["market-a"][0].sentiment, Sentiment::Bearish);
        // a2 and b1 were not in the lookup, or already matched
        assert_eq!(index.markets["market-a"][1].sentiment, Sentiment::Neutral);
        assert_eq!(index.markets["market-b"][0].sentiment, Sentiment::Bullish);
        assert_eq!(stats.aggregate_updates.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn timestamp_is_refreshed_on_write() {
        let dir = TempDir::new().unwrap();
        let path = seed_index(&dir);
        let stats = RunStats::new();
        let before: DateTime<Utc> = read_index(&path).unwrap().updated_at;

        let results = vec![result_with(vec![article("a1", Sentiment::Bullish)])];
        AggregateUpdater::new(&path, false).update(&results, &stats).await;

        assert!(read_index(&path).unwrap().updated_at > before);
    }

    #[tokio::test]
    async fn dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = seed_index(&dir);
        let before = fs::read_to_string(&path).unwrap();
        let stats = RunStats::new();

        let results = vec![result_with(vec![article("a1", Sentiment::Bearish)])];
        AggregateUpdater::new(&path, true).update(&results, &stats).await;

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn missing_index_abandons_update_with_one_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does_not_exist.json");
        let stats = RunStats::new();

        let results = vec![result_with(vec![article("a1", Sentiment::Bearish)])];
        AggregateUpdater::new(&path, false).update(&results, &stats).await;

        assert!(!path.exists());
        assert_eq!(stats.error_count(), 1);
    }

    #[tokio::test]
    async fn last_result_wins_on_colliding_ids() {
        let dir = TempDir::new().unwrap();
        let path = seed_index(&dir);
        let stats = RunStats::new();

        let results = vec![
            result_with(vec![article("a1", Sentiment::Bullish)]),
            ReconcileResult {
                market_id: "market-z".to_string(),
                articles: vec![article("a1", Sentiment::Bearish)],
                changed: true,
            },
        ];
        AggregateUpdater::new(&path, false).update(&results, &stats).await;

        let index = read_index(&path).unwrap();
        assert_eq!(index.markets["market-a"][0].sentiment, Sentiment::Bearish);
    }
}
