//! In-process staging store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StagingStore;
use crate::error::StagingError;

/// Staging store held in memory. Entries do not survive the process.
#[derive(Debug, Default)]
pub struct MemoryStagingStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StagingStore for MemoryStagingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StagingError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StagingError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StagingError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
