use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use crate::models::Sentiment;

/// Run-scoped counters, shared by every concurrent reconciliation.
/// Lives only for the duration of one run; reported once at the end.
#[derive(Debug, Default)]
pub struct RunStats {
    pub files_processed: AtomicUsize,
    pub articles_processed: AtomicUsize,
    pub bullish_changes: AtomicUsize,
    pub bearish_changes: AtomicUsize,
    pub neutral_changes: AtomicUsize,
    pub aggregate_updates: AtomicUsize,
    pub errors: AtomicUsize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_article(&self) {
        self.articles_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_change(&self, new_sentiment: Sentiment) {
        let counter = match new_sentiment {
            Sentiment::Bullish => &self.bullish_changes,
            Sentiment::Bearish => &self.bearish_changes,
            Sentiment::Neutral => &self.neutral_changes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_aggregate_update(&self) {
        self.aggregate_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn change_count(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Bullish => self.bullish_changes.load(Ordering::Relaxed),
            Sentiment::Bearish => self.bearish_changes.load(Ordering::Relaxed),
            Sentiment::Neutral => self.neutral_changes.load(Ordering::Relaxed),
        }
    }

    /// Log the end-of-run summary.
    pub fn report(&self, dry_run: bool) {
        info!(
            "Done: {} files, {} articles processed{}",
            self.files_processed.load(Ordering::Relaxed),
            self.articles_processed.load(Ordering::Relaxed),
            if dry_run { " (dry run, nothing written)" } else { "" }
        );
        info!(
            "Changes: {} bullish, {} bearish, {} neutral; {} aggregate references updated",
            self.bullish_changes.load(Ordering::Relaxed),
            self.bearish_changes.load(Ordering::Relaxed),
            self.neutral_changes.load(Ordering::Relaxed),
            self.aggregate_updates.load(Ordering::Relaxed),
        );
        let errors = self.error_count();
        if errors > 0 {
            info!("Completed with {} contained errors, see log above", errors);
        }
    }
}
