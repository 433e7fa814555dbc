//! Query cache data model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::QueryKey;

/// One result held in the in-memory query cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedQuery {
    pub key: QueryKey,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

/// A cache entry as written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCacheEntry {
    pub key: QueryKey,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
    /// Cache generation tag; entries from another generation are dropped.
    #[serde(default)]
    pub buster: String,
    pub persisted_at: DateTime<Utc>,
}

impl PersistedCacheEntry {
    pub fn from_query(query: &CachedQuery, buster: &str, persisted_at: DateTime<Utc>) -> Self {
        Self {
            key: query.key.clone(),
            data: query.data.clone(),
            updated_at: query.updated_at,
            buster: buster.to_string(),
            persisted_at,
        }
    }

    pub fn into_query(self) -> CachedQuery {
        CachedQuery {
            key: self.key,
            data: self.data,
            updated_at: self.updated_at,
        }
    }
}

/// Query key segments whose results must never reach durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    segments: HashSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// True when any segment of the key is in the set.
    pub fn excludes(&self, key: &QueryKey) -> bool {
        key.segments().iter().any(|s| self.segments.contains(s))
    }

    pub fn should_persist(&self, key: &QueryKey) -> bool {
        !self.excludes(key)
    }
}

/// How a query reacts to a refetch trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefetchPolicy {
    /// Re-fetch regardless of cached freshness.
    #[default]
    Always,
    /// Re-fetch only when the cached result is stale.
    IfStale,
    Never,
}

/// Events that may cause cached queries to be re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchTrigger {
    Mount,
    WindowFocus,
    Reconnect,
}
