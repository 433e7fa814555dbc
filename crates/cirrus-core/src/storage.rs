//! Key-value store abstraction.
//!
//! Both the local session storage and the durable offline store are modelled
//! by [`KeyValueStore`], so tests can substitute an in-memory fake for either.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// An abstract, clearable key-value store holding JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: The store could not be read
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Inserts or replaces a value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a value. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Lists all keys currently stored.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Removes every entry. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<()>;
}
