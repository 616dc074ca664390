//! Ollama-backed inference.

use async_trait::async_trait;
use ollama_client::OllamaClient;

use crate::error::{ResolveError, Result};
use crate::traits::inference::Inference;

/// [`Inference`] implementation over a local Ollama service.
pub struct OllamaInference {
    client: OllamaClient,
}

impl OllamaInference {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Inference for OllamaInference {
    async fn generate(&self, prompt: &str, timeout_ms: u64) -> Result<String> {
        self.client
            .generate(prompt, timeout_ms)
            .await
            .map_err(ResolveError::inference)
    }

    async fn health_check(&self) -> bool {
        self.client.health_check().await
    }
}
