//! Backend ports consumed by the session lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Account details returned by the probe endpoint.
///
/// The watchdog only cares whether the call succeeded; the fields are kept
/// for callers that display them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub storage_used: u64,
    #[serde(default)]
    pub max_storage: u64,
}

/// Tells the backend the session is actively in use.
#[async_trait]
pub trait PresenceApi: Send + Sync {
    async fn report_presence(&self, timestamp: DateTime<Utc>) -> Result<()>;
}

/// Authenticated call used to detect session invalidity.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn fetch_account(&self) -> Result<Account>;
}
