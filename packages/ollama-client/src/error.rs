//! Error types for the Ollama client.

use thiserror::Error;

/// Result type for Ollama client operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Ollama client errors.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Configuration error (bad base URL, missing model name)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (service not running, connection refused)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Generation exceeded the caller's deadline
    #[error("generation timed out after {0} ms")]
    Timeout(u64),

    /// Non-2xx response from the service
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}
