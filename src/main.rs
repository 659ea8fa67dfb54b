use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use relabeler::completion::CompletionClient;
use relabeler::config;
use relabeler::pipeline::{AggregateUpdater, ArticleClassifier, MarketReconciler, WaveScheduler};
use relabeler::stats::RunStats;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Classify everything but write nothing to disk
    #[arg(long)]
    dry_run: bool,

    /// Cap the number of market files processed
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting news sentiment relabeler");

    let cli = Cli::parse();
    if cli.dry_run {
        info!("Running in DRY RUN mode, no files will be written");
    }

    // Fails fast here if the credential is missing, before any work starts
    let config = config::load_config().await?;

    let mut files = list_market_files(&config.markets_dir)?;
    if let Some(limit) = cli.limit {
        files.truncate(limit);
    }
    if files.is_empty() {
        info!("No market files found in {}", config.markets_dir.display());
        return Ok(());
    }
    info!(
        "Relabeling {} market files in waves of {}",
        files.len(),
        config.wave_size
    );

    let stats = Arc::new(RunStats::new());
    let client = Arc::new(CompletionClient::new(&config));
    let classifier = ArticleClassifier::new(client, config.chunk_size, config.max_tokens);
    let reconciler = MarketReconciler::new(classifier, cli.dry_run);
    let scheduler = WaveScheduler::new(reconciler, config.wave_size);

    let results = scheduler.run(&files, &stats).await;

    let updater = AggregateUpdater::new(&config.aggregate_path, cli.dry_run);
    updater.update(&results, &stats).await;

    stats.report(cli.dry_run);
    Ok(())
}

/// Every .json file in the markets directory, sorted by name so runs are
/// deterministic and --limit is stable.
fn list_market_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading markets directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}
