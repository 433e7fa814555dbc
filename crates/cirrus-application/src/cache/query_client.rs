use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cirrus_core::query::{CachedQuery, QueryKey, RefetchPolicy, RefetchTrigger};
use serde_json::Value;
use tokio::sync::{RwLock, watch};

/// Defaults applied to every query in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    /// `None` means results never go stale.
    pub stale_time: Option<Duration>,
    pub refetch_on_mount: RefetchPolicy,
    pub refetch_on_window_focus: RefetchPolicy,
    pub refetch_on_reconnect: RefetchPolicy,
}

impl Default for QueryDefaults {
    /// Cached data is kept forever but always re-fetched: the cache speeds
    /// up cold starts, live data still wins.
    fn default() -> Self {
        Self {
            stale_time: None,
            refetch_on_mount: RefetchPolicy::Always,
            refetch_on_window_focus: RefetchPolicy::Always,
            refetch_on_reconnect: RefetchPolicy::Always,
        }
    }
}

impl QueryDefaults {
    pub fn policy_for(&self, trigger: RefetchTrigger) -> RefetchPolicy {
        match trigger {
            RefetchTrigger::Mount => self.refetch_on_mount,
            RefetchTrigger::WindowFocus => self.refetch_on_window_focus,
            RefetchTrigger::Reconnect => self.refetch_on_reconnect,
        }
    }
}

/// In-memory query result cache.
///
/// Writes bump a change counter that the persister watches.
pub struct QueryClient {
    queries: RwLock<HashMap<QueryKey, CachedQuery>>,
    defaults: QueryDefaults,
    changes: watch::Sender<u64>,
}

impl QueryClient {
    pub fn new(defaults: QueryDefaults) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            queries: RwLock::new(HashMap::new()),
            defaults,
            changes,
        }
    }

    pub async fn set_query_data(&self, key: QueryKey, data: Value) {
        let query = CachedQuery {
            key: key.clone(),
            data,
            updated_at: Utc::now(),
        };
        self.queries.write().await.insert(key, query);
        self.notify_changed();
    }

    pub async fn get_query_data(&self, key: &QueryKey) -> Option<Value> {
        self.queries.read().await.get(key).map(|q| q.data.clone())
    }

    pub async fn remove(&self, key: &QueryKey) -> bool {
        let removed = self.queries.write().await.remove(key).is_some();
        if removed {
            self.notify_changed();
        }
        removed
    }

    pub async fn clear(&self) {
        self.queries.write().await.clear();
        self.notify_changed();
    }

    pub async fn len(&self) -> usize {
        self.queries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queries.read().await.is_empty()
    }

    /// All cached queries, cloned.
    pub async fn snapshot(&self) -> Vec<CachedQuery> {
        self.queries.read().await.values().cloned().collect()
    }

    /// Loads restored entries without signalling a change; entries already
    /// present in memory are newer and win.
    pub async fn hydrate(&self, restored: Vec<CachedQuery>) -> usize {
        let mut queries = self.queries.write().await;
        let mut inserted = 0;
        for query in restored {
            if !queries.contains_key(&query.key) {
                queries.insert(query.key.clone(), query);
                inserted += 1;
            }
        }
        inserted
    }

    pub fn is_stale(&self, query: &CachedQuery, now: DateTime<Utc>) -> bool {
        match self.defaults.stale_time {
            None => false,
            Some(stale_time) => now
                .signed_duration_since(query.updated_at)
                .to_std()
                .map(|age| age >= stale_time)
                // Clock went backwards; treat as fresh.
                .unwrap_or(false),
        }
    }

    /// Keys the caller should re-fetch in response to `trigger`.
    pub async fn refetch_targets(&self, trigger: RefetchTrigger) -> Vec<QueryKey> {
        let now = Utc::now();
        let queries = self.queries.read().await;
        let mut keys: Vec<QueryKey> = match self.defaults.policy_for(trigger) {
            RefetchPolicy::Always => queries.keys().cloned().collect(),
            RefetchPolicy::IfStale => queries
                .values()
                .filter(|q| self.is_stale(q, now))
                .map(|q| q.key.clone())
                .collect(),
            RefetchPolicy::Never => Vec::new(),
        };
        keys.sort();
        keys
    }

    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryDefaults::default())
    }
}
