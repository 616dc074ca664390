//! Crawl-candidate URL provider interface.

use async_trait::async_trait;

use crate::error::Result;

/// Supplies the crawl-discovered start URL for a domain.
///
/// The upstream keyword crawler owns this data; the batch orchestrator
/// only reads it. `Ok(None)` makes the domain fail fast with a per-domain
/// error, never aborting the batch.
#[async_trait]
pub trait CandidateUrls: Send + Sync {
    async fn candidate_url(&self, domain: &str) -> Result<Option<String>>;
}
