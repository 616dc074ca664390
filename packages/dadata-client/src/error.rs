//! Error types for the DaData client.

use thiserror::Error;

/// Result type for DaData client operations.
pub type Result<T> = std::result::Result<T, DadataError>;

/// DaData client errors.
#[derive(Debug, Error)]
pub enum DadataError {
    /// Configuration error (no API keys supplied)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Daily quota or rate limit exhausted on a key
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Key rejected (invalid or revoked)
    #[error("authorization denied: {0}")]
    AuthDenied(String),

    /// Non-2xx response outside the quota/auth family
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// All configured keys exhausted without a successful call
    #[error("all {attempts} API keys exhausted, last error: {last}")]
    KeysExhausted {
        attempts: usize,
        #[source]
        last: Box<DadataError>,
    },
}

impl DadataError {
    /// Whether this error should trigger rotation to the next API key.
    pub fn is_rotatable(&self) -> bool {
        matches!(
            self,
            DadataError::QuotaExhausted(_) | DadataError::AuthDenied(_)
        )
    }
}
