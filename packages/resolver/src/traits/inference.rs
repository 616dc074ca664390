//! Text-generation capability interface.

use async_trait::async_trait;

use crate::error::Result;

/// Capability interface to a local text-generation service.
///
/// The resolver uses it for one thing: choosing the next link to click
/// when no learned or fallback pattern matches.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Return a free-text completion for `prompt` within `timeout_ms`.
    async fn generate(&self, prompt: &str, timeout_ms: u64) -> Result<String>;

    /// Whether the service is reachable and ready.
    async fn health_check(&self) -> bool;
}
