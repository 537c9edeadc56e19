use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ScriptStore, StoreResult};

/// Process-local store, used for tests and single-node development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of video keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ScriptStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        debug!("memory get {}", key);
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> StoreResult<()> {
        debug!("memory put {} ({} bytes)", key, value.len());
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        debug!("memory delete {}", key);
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
