//! Authoritative company-registry capability interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A registry record for one legal entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Tax identifier (10 or 12 digits)
    pub inn: String,
    /// Display name, e.g. `ООО "РОМАШКА"`
    pub name: String,
    /// Registry status, e.g. "ACTIVE"
    pub status: Option<String>,
    pub address: Option<String>,
}

impl RegistryRecord {
    pub fn new(inn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            inn: inn.into(),
            name: name.into(),
            status: None,
            address: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Whether the registry considers this entity operating.
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_deref(), Some("ACTIVE"))
    }
}

/// Capability interface to an authoritative registry lookup service.
///
/// `Ok(None)` means no confident unique match, a normal outcome.
/// `Err` is reserved for infrastructure failures (which the backend is
/// expected to have already retried across its credentials).
#[async_trait]
pub trait Registry: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<Option<RegistryRecord>>;
}
