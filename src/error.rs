//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("AI provider returned status {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed model reply: {0}")]
    MalformedReply(String),

    #[error("AI provider unavailable after {attempts} attempts: {last_error}")]
    ProviderUnavailable { attempts: u32, last_error: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the provider client should retry the call that produced this
    /// error.
    ///
    /// Retryable: transport timeouts and connection failures, rate limits
    /// (429) and server errors (5xx). Everything else is returned as-is.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::ProviderStatus { status, .. } => {
                *status == 429 || (500..=599).contains(status)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
