//! Typed errors for the resolution library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Only unrecoverable infrastructure faults surface as errors. "Identifier
//! not found" is a normal terminal state carried inside
//! [`ExtractionAttempt`](crate::types::attempt::ExtractionAttempt), never
//! an `Err`.

use thiserror::Error;

/// Errors that can occur during a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Browser session dead or unusable
    #[error("browser session error: {0}")]
    Session(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Inference service unreachable or failed
    #[error("inference service error: {0}")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Registry lookup infrastructure failure
    #[error("registry error: {0}")]
    Registry(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Domain has no crawl-discovered candidate URL
    #[error("no crawl candidate URL for domain: {domain}")]
    NoCandidateUrl { domain: String },

    /// Learning store failed to load or persist
    #[error("learning store error: {0}")]
    Learning(#[from] LearningError),
}

impl ResolveError {
    /// Wrap an arbitrary error as a dead-session fault.
    pub fn session(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Session(e.into())
    }

    /// Wrap an arbitrary error as an inference fault.
    pub fn inference(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Inference(e.into())
    }

    /// Wrap an arbitrary error as a registry fault.
    pub fn registry(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Registry(e.into())
    }
}

/// Errors that can occur inside the pattern learning store.
#[derive(Debug, Error)]
pub enum LearningError {
    /// Filesystem read/write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted document could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Result type alias for learning-store operations.
pub type LearningResult<T> = std::result::Result<T, LearningError>;
