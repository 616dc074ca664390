//! Pure Ollama REST API client.
//!
//! A minimal client for a locally running Ollama text-generation service.
//! Supports non-streaming completions with a per-call deadline and a
//! health probe against `/api/tags`.
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::OllamaClient;
//!
//! let client = OllamaClient::new("qwen2.5:7b");
//!
//! if client.health_check().await {
//!     let reply = client.generate("Pick a link: ...", 30_000).await?;
//!     println!("{reply}");
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{OllamaError, Result};
pub use types::{GenerateOptions, GenerateRequest, GenerateResponse, TagsResponse};

use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama API client bound to one model.
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: Option<GenerateOptions>,
}

impl OllamaClient {
    /// Create a client for the given model against the default local endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            options: None,
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set sampling options for every generation call.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The model this client is bound to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion for `prompt`, failing after `timeout_ms`.
    pub async fn generate(&self, prompt: &str, timeout_ms: u64) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: self.options.clone(),
        };

        let fut = async {
            let resp = self.client.post(&url).json(&body).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(OllamaError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            let parsed: GenerateResponse = resp.json().await?;
            debug!(
                model = %self.model,
                eval_count = ?parsed.eval_count,
                "generation complete"
            );
            Ok(parsed.response)
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), fut)
            .await
            .map_err(|_| OllamaError::Timeout(timeout_ms))?
    }

    /// Probe the service: true when `/api/tags` answers with a 2xx.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama health check failed");
                false
            }
        }
    }
}
