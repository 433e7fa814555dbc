//! Authenticated flag stored in local session storage.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use crate::error::Result;
use crate::storage::KeyValueStore;

/// Reactive view of the `authed` entry in local session storage.
///
/// The store is the source of truth: clearing it signs the user out. The
/// watch channel mirrors the last value read or written so the lifecycle
/// can react to changes without polling.
pub struct AuthFlag {
    store: Arc<dyn KeyValueStore>,
    key: String,
    tx: watch::Sender<bool>,
}

impl AuthFlag {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            store,
            key: key.into(),
            tx,
        }
    }

    /// Reads the flag from storage. Unreadable storage counts as signed out.
    pub async fn is_authenticated(&self) -> bool {
        let value = match self.store.get(&self.key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[Auth] Failed to read '{}': {}", self.key, e);
                None
            }
        };
        let authenticated = matches!(value, Some(Value::Bool(true)));
        self.publish(authenticated);
        authenticated
    }

    /// Writes the flag. Called by the login flow elsewhere in the app.
    pub async fn set_authenticated(&self, authenticated: bool) -> Result<()> {
        self.store.set(&self.key, Value::Bool(authenticated)).await?;
        self.publish(authenticated);
        Ok(())
    }

    /// Re-reads storage and notifies subscribers of any change.
    pub async fn refresh(&self) -> bool {
        self.is_authenticated().await
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    fn publish(&self, authenticated: bool) {
        self.tx.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }
}
