//! Pure DaData suggestions API client.
//!
//! A minimal client for the DaData party-suggestion API, used to look up a
//! legal entity's registry record by INN, OGRN, or name. Supports an
//! ordered list of API keys with automatic failover: when a key runs out
//! of daily quota or is rejected, the client rotates to the next key and
//! retries the same request.
//!
//! # Example
//!
//! ```rust,ignore
//! use dadata_client::DadataClient;
//!
//! let client = DadataClient::new(vec!["key-1".into(), "key-2".into()])?;
//!
//! if let Some(party) = client.find_party("7707083893").await? {
//!     println!("{} ({})", party.value, party.data.inn.as_deref().unwrap_or("?"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{DadataError, Result};
pub use types::{PartyData, PartyQuery, PartySuggestion, SuggestResponse};

use secrecy::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicUsize, Ordering};

const BASE_URL: &str = "https://suggestions.dadata.ru/suggestions/api/4_1/rs";

/// Substrings that mark a quota failure delivered inside a 200-status body.
/// DaData (and compatible mirrors) sometimes report exhaustion this way
/// instead of via an HTTP status.
const BODY_QUOTA_MARKERS: &[&str] = &["limit", "quota", "лимит", "исчерпан"];

/// DaData API client with ordered-key failover.
///
/// The rotation cursor is shared across clones; two concurrent callers that
/// both observe a quota failure on the same key rotate it exactly once.
pub struct DadataClient {
    client: reqwest::Client,
    keys: Vec<SecretString>,
    cursor: AtomicUsize,
    base_url: String,
}

impl DadataClient {
    /// Create a client over an ordered list of API keys.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(DadataError::Config("no DaData API keys supplied".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            keys: keys.into_iter().map(SecretString::from).collect(),
            cursor: AtomicUsize::new(0),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Create from the `DADATA_API_KEYS` environment variable
    /// (comma-separated, highest priority first).
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("DADATA_API_KEYS")
            .map_err(|_| DadataError::Config("DADATA_API_KEYS not set".into()))?;
        Self::new(
            raw.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    /// Set a custom base URL (for mirrors or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Number of configured keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Look up a party by INN, OGRN, or exact name.
    ///
    /// Returns `Ok(None)` when the registry has no match, a normal
    /// outcome, not an error. Rotates through the key list on quota or
    /// authorization failures; after every key has failed, returns
    /// [`DadataError::KeysExhausted`] wrapping the last error.
    pub async fn find_party(&self, query: &str) -> Result<Option<PartySuggestion>> {
        let mut suggestions = self.request("findById/party", query, Some(1)).await?;
        Ok(suggestions.pop())
    }

    /// Free-form party suggestion (name fragments), up to `count` results.
    pub async fn suggest_party(&self, query: &str, count: u32) -> Result<Vec<PartySuggestion>> {
        self.request("suggest/party", query, Some(count)).await
    }

    async fn request(
        &self,
        endpoint: &str,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<PartySuggestion>> {
        let mut last_err: Option<DadataError> = None;

        for attempt in 0..self.keys.len() {
            let key_index = self.cursor.load(Ordering::Acquire) % self.keys.len();

            match self.request_with_key(endpoint, query, count, key_index).await {
                Ok(suggestions) => return Ok(suggestions),
                Err(e) if e.is_rotatable() => {
                    tracing::warn!(
                        endpoint,
                        key_index,
                        attempt,
                        error = %e,
                        "DaData key failed, rotating"
                    );
                    self.rotate_from(key_index);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(DadataError::KeysExhausted {
            attempts: self.keys.len(),
            last: Box::new(last_err.unwrap_or_else(|| {
                DadataError::Config("no attempt was made".into())
            })),
        })
    }

    async fn request_with_key(
        &self,
        endpoint: &str,
        query: &str,
        count: Option<u32>,
        key_index: usize,
    ) -> Result<Vec<PartySuggestion>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let body = PartyQuery {
            query: query.to_string(),
            count,
        };

        let resp = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Token {}", self.keys[key_index].expose_secret()),
            )
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        match status.as_u16() {
            401 => return Err(DadataError::AuthDenied(text)),
            403 | 429 => return Err(DadataError::QuotaExhausted(text)),
            s if !status.is_success() => {
                return Err(DadataError::Api {
                    status: s,
                    message: text,
                })
            }
            _ => {}
        }

        // Some quota failures arrive inside a 200-status payload.
        if !text.contains("suggestions") && body_signals_quota(&text) {
            return Err(DadataError::QuotaExhausted(text));
        }

        let parsed: SuggestResponse = serde_json::from_str(&text).map_err(|e| DadataError::Api {
            status: status.as_u16(),
            message: format!("unparseable response: {e}"),
        })?;
        Ok(parsed.suggestions)
    }

    /// Advance the cursor past `observed`, but only if no other caller has
    /// already done so. Compare-and-swap keeps two concurrent failures on
    /// the same key from skipping a usable one.
    fn rotate_from(&self, observed: usize) {
        let next = (observed + 1) % self.keys.len();
        let _ = self.cursor.compare_exchange(
            observed,
            next,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

fn body_signals_quota(body: &str) -> bool {
    let lower = body.to_lowercase();
    BODY_QUOTA_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_keys(n: usize) -> DadataClient {
        DadataClient::new((0..n).map(|i| format!("key-{i}")).collect()).unwrap()
    }

    #[test]
    fn rejects_empty_key_list() {
        assert!(matches!(
            DadataClient::new(vec![]),
            Err(DadataError::Config(_))
        ));
    }

    #[test]
    fn rotate_is_idempotent_per_observed_key() {
        let client = client_with_keys(3);

        // Two callers both saw key 0 fail; only the first rotation lands.
        client.rotate_from(0);
        client.rotate_from(0);
        assert_eq!(client.cursor.load(Ordering::Acquire), 1);

        client.rotate_from(1);
        assert_eq!(client.cursor.load(Ordering::Acquire), 2);
    }

    #[test]
    fn rotate_wraps_around() {
        let client = client_with_keys(2);
        client.rotate_from(0);
        client.rotate_from(1);
        assert_eq!(client.cursor.load(Ordering::Acquire), 0);
    }

    #[test]
    fn quota_markers_detected_in_body() {
        assert!(body_signals_quota(r#"{"message": "Daily limit reached"}"#));
        assert!(body_signals_quota("Дневной лимит исчерпан"));
        assert!(!body_signals_quota(r#"{"suggestions": []}"#));
    }

    #[test]
    fn rotatable_errors_classified() {
        assert!(DadataError::QuotaExhausted("x".into()).is_rotatable());
        assert!(DadataError::AuthDenied("x".into()).is_rotatable());
        assert!(!DadataError::Api {
            status: 500,
            message: "x".into()
        }
        .is_rotatable());
    }
}
