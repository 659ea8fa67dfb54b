use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::RelabelError;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The remote text-generation capability: submit messages, receive text.
#[async_trait]
pub trait Completions: Send + Sync {
    async fn submit(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}

pub struct CompletionClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
    base_delay: Duration,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        // base delay * 2^attempt
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

#[async_trait]
impl Completions for CompletionClient {
    async fn submit(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
        });

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    // Network-level failure; retry until the budget runs out
                    if attempt < self.max_retries {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            "Request failed ({}), retrying in {:?} (attempt {}/{})",
                            e, delay, attempt + 1, self.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(RelabelError::from(e).into());
                }
            };

            let status = response.status();
            if status.is_success() {
                let parsed: ChatResponse = response.json().await.map_err(RelabelError::from)?;
                let content = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default();
                debug!("Completion received ({} chars)", content.len());
                return Ok(content);
            }

            if RelabelError::is_transient_status(status.as_u16()) && attempt < self.max_retries {
                let delay = self.backoff_delay(attempt);
                warn!(
                    "Got {} from API, retrying in {:?} (attempt {}/{})",
                    status, delay, attempt + 1, self.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            // Terminal: non-retryable status, or retries exhausted
            let body_text = response.text().await.unwrap_or_default();
            return Err(RelabelError::api_error(status.as_u16(), body_text).into());
        }
    }
}
