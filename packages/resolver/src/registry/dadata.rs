//! DaData-backed registry lookup.
//!
//! Credential rotation and quota failover live inside
//! [`dadata_client::DadataClient`]; by the time an error surfaces here,
//! every configured key has already been tried.

use async_trait::async_trait;
use dadata_client::DadataClient;

use crate::error::{ResolveError, Result};
use crate::traits::registry::{Registry, RegistryRecord};

/// [`Registry`] implementation over the DaData party-suggestion API.
pub struct DadataRegistry {
    client: DadataClient,
}

impl DadataRegistry {
    pub fn new(client: DadataClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Registry for DadataRegistry {
    async fn lookup(&self, key: &str) -> Result<Option<RegistryRecord>> {
        let suggestion = self
            .client
            .find_party(key)
            .await
            .map_err(ResolveError::registry)?;

        Ok(suggestion
            .map(|s| {
                let name = s
                    .data
                    .name
                    .as_ref()
                    .and_then(|n| n.short_with_opf.clone())
                    .unwrap_or_else(|| s.value.clone());
                RegistryRecord {
                    inn: s.data.inn.clone().unwrap_or_default(),
                    name,
                    status: s.data.state.as_ref().and_then(|st| st.status.clone()),
                    address: s.data.address.as_ref().and_then(|a| a.value.clone()),
                }
            })
            .filter(|record| !record.inn.is_empty()))
    }
}
