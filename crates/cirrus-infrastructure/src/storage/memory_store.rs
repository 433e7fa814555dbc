use std::collections::BTreeMap;

use async_trait::async_trait;
use cirrus_core::error::Result;
use cirrus_core::storage::KeyValueStore;
use serde_json::Value;
use tokio::sync::RwLock;

/// Volatile key-value store. Keys are listed in sorted order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.values.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.values.write().await.clear();
        Ok(())
    }
}
