//! Durable persistence for the query cache.
//!
//! Each eligible query is written under `<prefix><hash key>` in the durable
//! store. Durable storage only ever holds a subset of memory: excluded keys
//! are never written, and entries that leave memory are removed on the next
//! persist.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cirrus_core::config::CacheConfig;
use cirrus_core::error::Result;
use cirrus_core::query::{CachedQuery, ExclusionSet, PersistedCacheEntry};
use cirrus_core::storage::KeyValueStore;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::query_client::QueryClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    Restoring,
    Restored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub written: usize,
    pub removed: usize,
    /// Entries whose write failed; their stale durable copies are removed.
    pub failed: usize,
}

pub struct PersistedQueryCache {
    client: Arc<QueryClient>,
    store: Arc<dyn KeyValueStore>,
    exclusions: ExclusionSet,
    prefix: String,
    buster: String,
    max_age: Option<Duration>,
    restore_tx: watch::Sender<RestorePhase>,
}

impl PersistedQueryCache {
    pub fn new(client: Arc<QueryClient>, store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        let (restore_tx, _) = watch::channel(RestorePhase::Restoring);
        Self {
            client,
            store,
            exclusions: ExclusionSet::new(config.uncached_query_keys.iter().cloned()),
            prefix: config.storage_prefix.clone(),
            buster: config.buster.clone(),
            max_age: config.max_age(),
            restore_tx,
        }
    }

    pub fn client(&self) -> &Arc<QueryClient> {
        &self.client
    }

    pub fn restore_status(&self) -> watch::Receiver<RestorePhase> {
        self.restore_tx.subscribe()
    }

    pub fn is_restored(&self) -> bool {
        *self.restore_tx.borrow() == RestorePhase::Restored
    }

    /// Reads the durable store back into memory.
    ///
    /// Always ends in `Restored`: a failed restore leaves the cache empty
    /// and the app starts cold rather than staying on the loading screen.
    pub async fn restore(&self) -> Result<usize> {
        let result = self.restore_entries().await;
        match &result {
            Ok(count) => tracing::info!("[QueryCache] Restored {} queries", count),
            Err(e) => {
                tracing::warn!("[QueryCache] Restore failed, starting cold: {}", e);
                if let Err(e) = self.remove_owned_keys(&HashSet::new()).await {
                    tracing::warn!("[QueryCache] Failed to drop persisted entries: {}", e);
                }
            }
        }
        self.restore_tx.send_replace(RestorePhase::Restored);
        result
    }

    /// Writes the current cache to durable storage.
    ///
    /// A no-op until restore has finished, so an empty cold-start cache
    /// cannot wipe the persisted one. A failed write is logged and skipped;
    /// the remaining entries are still written.
    pub async fn persist(&self) -> Result<PersistReport> {
        if !self.is_restored() {
            tracing::debug!("[QueryCache] Restore pending, skipping persist");
            return Ok(PersistReport::default());
        }

        let persisted_at = Utc::now();
        let mut keep = HashSet::new();
        let mut report = PersistReport::default();

        for query in self.client.snapshot().await {
            if !self.exclusions.should_persist(&query.key) {
                continue;
            }
            let storage_key = self.storage_key(&query);
            let entry = PersistedCacheEntry::from_query(&query, &self.buster, persisted_at);
            let written = match serde_json::to_value(&entry) {
                Ok(value) => self.store.set(&storage_key, value).await,
                Err(e) => Err(e.into()),
            };
            match written {
                Ok(()) => {
                    keep.insert(storage_key);
                    report.written += 1;
                }
                Err(e) => {
                    tracing::warn!("[QueryCache] Failed to persist '{}': {}", storage_key, e);
                    report.failed += 1;
                }
            }
        }

        report.removed = self.remove_owned_keys(&keep).await?;
        tracing::debug!(
            "[QueryCache] Persisted {} queries, removed {}, failed {}",
            report.written,
            report.removed,
            report.failed
        );
        Ok(report)
    }

    /// Persists after cache changes, at most once per `throttle`, until
    /// cancelled. Pending changes are flushed on cancellation.
    pub async fn run_persist_loop(self: Arc<Self>, throttle: Duration, cancel: CancellationToken) {
        let mut changes = self.client.subscribe_changes();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = changes.changed() => if changed.is_err() { break },
            }
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(throttle) => {}
            }
            changes.borrow_and_update();
            if let Err(e) = self.persist().await {
                tracing::warn!("[QueryCache] Persist failed: {}", e);
            }
            if cancel.is_cancelled() {
                break;
            }
        }

        if changes.has_changed().unwrap_or(false)
            && let Err(e) = self.persist().await
        {
            tracing::warn!("[QueryCache] Final persist failed: {}", e);
        }
        tracing::debug!("[QueryCache] Persist loop stopped");
    }

    async fn restore_entries(&self) -> Result<usize> {
        let now = Utc::now();
        let mut restored: Vec<CachedQuery> = Vec::new();

        for storage_key in self.owned_keys().await? {
            let Some(value) = self.store.get(&storage_key).await? else {
                continue;
            };
            let entry = match serde_json::from_value::<PersistedCacheEntry>(value) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[QueryCache] Dropping corrupt entry '{}': {}", storage_key, e);
                    self.store.remove(&storage_key).await?;
                    continue;
                }
            };

            if let Some(reason) = self.discard_reason(&entry, now) {
                tracing::debug!("[QueryCache] Dropping '{}': {}", storage_key, reason);
                self.store.remove(&storage_key).await?;
                continue;
            }
            restored.push(entry.into_query());
        }

        Ok(self.client.hydrate(restored).await)
    }

    fn discard_reason(&self, entry: &PersistedCacheEntry, now: chrono::DateTime<Utc>) -> Option<&'static str> {
        if entry.buster != self.buster {
            return Some("buster mismatch");
        }
        if self.exclusions.excludes(&entry.key) {
            return Some("key is uncached");
        }
        if let Some(max_age) = self.max_age {
            let expired = now
                .signed_duration_since(entry.persisted_at)
                .to_std()
                .is_ok_and(|age| age > max_age);
            if expired {
                return Some("expired");
            }
        }
        None
    }

    async fn owned_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn remove_owned_keys(&self, keep: &HashSet<String>) -> Result<usize> {
        let mut removed = 0;
        for key in self.owned_keys().await? {
            if !keep.contains(&key) {
                self.store.remove(&key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn storage_key(&self, query: &CachedQuery) -> String {
        format!("{}{}", self.prefix, query.key.hash_key())
    }
}
