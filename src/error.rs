use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum RelabelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelabelError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Statuses worth retrying before giving up on a request.
    pub fn is_transient_status(status: u16) -> bool {
        matches!(status, 429 | 502 | 503 | 504)
    }
}

pub type Result<T> = std::result::Result<T, RelabelError>;
