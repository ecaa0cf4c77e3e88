//! In-process share repository
//!
//! Same validation and upsert semantics as the SQLite store, without
//! durability. Useful for tests and for callers that keep shares only for the
//! lifetime of the process.

use super::ShareRepository;
use crate::error::require_non_empty;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    shares: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.shares.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shares.read().await.is_empty()
    }
}

#[async_trait]
impl ShareRepository for MemoryShareStore {
    async fn get_share(&self, identifier: &str) -> Result<Option<String>> {
        require_non_empty("identifier", identifier)?;
        Ok(self.shares.read().await.get(identifier).cloned())
    }

    async fn set_share(&self, identifier: &str, envelope: &str) -> Result<()> {
        require_non_empty("identifier", identifier)?;
        require_non_empty("envelope", envelope)?;

        self.shares
            .write()
            .await
            .insert(identifier.to_string(), envelope.to_string());
        tracing::debug!(identifier = %identifier, "Stored key share in memory");
        Ok(())
    }
}
