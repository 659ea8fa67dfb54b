use futures::future;
use std::path::PathBuf;
use tracing::info;

use crate::models::ReconcileResult;
use crate::pipeline::MarketReconciler;
use crate::stats::RunStats;

pub struct WaveScheduler {
    reconciler: MarketReconciler,
    wave_size: usize,
}

impl WaveScheduler {
    pub fn new(reconciler: MarketReconciler, wave_size: usize) -> Self {
        Self {
            reconciler,
            wave_size: wave_size.max(1),
        }
    }

    /// Process every file, `wave_size` at a time. Files within a wave run
    /// concurrently; the next wave starts only when the whole wave is done.
    /// Returns one result per input file.
    pub async fn run(&self, files: &[PathBuf], stats: &RunStats) -> Vec<ReconcileResult> {
        let total = files.len();
        let mut results = Vec::with_capacity(total);
        let mut processed = 0;

        for wave in files.chunks(self.wave_size) {
            let wave_results = future::join_all(
                wave.iter().map(|path| self.reconciler.reconcile(path, stats)),
            )
            .await;

            processed += wave.len();
            let changed = wave_results.iter().filter(|r| r.changed).count();
            info!(
                "Wave done: {} of {} files changed ({}/{} processed, {:.0}%)",
                changed,
                wave.len(),
                processed,
                total,
                processed as f64 / total as f64 * 100.0
            );

            results.extend(wave_results);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{ChatMessage, Completions};
    use crate::pipeline::ArticleClassifier;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NeutralCompletions;

    #[async_trait]
    impl Completions for NeutralCompletions {
        async fn submit(&self, _messages: &[ChatMessage], _max_tokens: u32) -> Result<String> {
            Ok("[\"neutral\",\"neutral\",\"neutral\",\"neutral\",\"neutral\"]".to_string())
        }
    }

    fn scheduler(wave_size: usize) -> WaveScheduler {
        let classifier = ArticleClassifier::new(Arc::new(NeutralCompletions), 5, 200);
        WaveScheduler::new(MarketReconciler::new(classifier, true), wave_size)
    }

    fn make_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("market-{}.json", i));
                fs::write(
                    &path,
                    format!(r#"[{{"id": "a{}", "title": "T", "sentiment": "neutral"}}]"#, i),
                )
                .unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn result_count_matches_input_for_all_sizes() {
        const WAVE: usize = 3;
        for count in [0usize, 1, WAVE, WAVE + 1] {
            let dir = TempDir::new().unwrap();
            let files = make_files(&dir, count);
            let stats = RunStats::new();

            let results = scheduler(WAVE).run(&files, &stats).await;
            assert_eq!(results.len(), count, "count {}", count);
        }
    }

    #[tokio::test]
    async fn every_file_is_processed_exactly_once() {
        let dir = TempDir::new().unwrap();
        let files = make_files(&dir, 7);
        let stats = RunStats::new();

        let results = scheduler(3).run(&files, &stats).await;

        let seen: HashSet<_> = results.iter().map(|r| r.market_id.clone()).collect();
        assert_eq!(seen.len(), 7);
        for i in 0..7 {
            assert!(seen.contains(&format!("market-{}", i)));
        }
    }
}
