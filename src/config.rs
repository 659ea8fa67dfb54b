use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub markets_dir: PathBuf,
    pub aggregate_path: PathBuf,

    // Batch orchestration settings
    pub chunk_size: usize,
    pub wave_size: usize,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            markets_dir: PathBuf::from("./data/markets"),
            aggregate_path: PathBuf::from("./data/news_index.json"),
            chunk_size: 5,
            wave_size: 100,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_tokens: 200,
        }
    }
}

pub async fn load_config() -> Result<Config> {
    let mut config = Config::default();

    // The credential is the one hard requirement; everything else has defaults.
    config.api_key = env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY environment variable not set")?;
    if config.api_key.trim().is_empty() {
        anyhow::bail!("OPENAI_API_KEY is set but empty");
    }

    // Override defaults with environment variables
    if let Ok(api_url) = env::var("OPENAI_API_URL") {
        config.api_url = api_url;
    }

    if let Ok(model) = env::var("OPENAI_MODEL") {
        config.model = model;
    }

    if let Ok(markets_dir) = env::var("MARKETS_DIR") {
        config.markets_dir = PathBuf::from(markets_dir);
    }

    if let Ok(aggregate_path) = env::var("NEWS_INDEX_PATH") {
        config.aggregate_path = PathBuf::from(aggregate_path);
    }

    if let Ok(chunk_size) = env::var("CLASSIFY_CHUNK_SIZE") {
        config.chunk_size = chunk_size
            .parse()
            .context("CLASSIFY_CHUNK_SIZE must be a positive integer")?;
    }

    if let Ok(wave_size) = env::var("WAVE_SIZE") {
        config.wave_size = wave_size
            .parse()
            .context("WAVE_SIZE must be a positive integer")?;
    }

    Ok(config)
}
