//! Shell configuration model.
//!
//! Loaded from `config.toml` by the infrastructure `ConfigService`. Every
//! field has a default so a missing or partial file yields a working shell.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    pub deployment: DeploymentKind,
    pub presence: PresenceConfig,
    pub watchdog: WatchdogConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub backend: BackendConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PresenceConfig {
    /// How often the reporter checks whether a report is due.
    pub tick_ms: u64,
    /// Minimum spacing between two successful reports.
    pub throttle_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            throttle_ms: 15_000,
        }
    }
}

impl PresenceConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Delay between a settled probe and the next one.
    pub interval_ms: u64,
    /// All of these must appear (case-insensitively) in a probe failure
    /// message for it to count as an authorization failure.
    pub authorization_markers: Vec<String>,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            authorization_markers: vec!["api".to_string(), "key".to_string()],
        }
    }
}

impl WatchdogConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Path fragments identifying an unauthenticated public link view.
    pub public_link_markers: Vec<String>,
    pub login_path: String,
    /// Local storage key holding the authenticated flag.
    pub authenticated_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            public_link_markers: vec!["/f/".to_string(), "/d/".to_string()],
            login_path: "/login".to_string(),
            authenticated_key: "authed".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Query key segments whose results are never written to durable storage.
    pub uncached_query_keys: Vec<String>,
    /// Maximum age of a restorable entry; `None` keeps entries forever.
    pub max_age_ms: Option<u64>,
    /// Persisted snapshots written under a different buster are discarded.
    pub buster: String,
    pub persist_throttle_ms: u64,
    /// Prefix for durable store keys owned by the query cache.
    pub storage_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            uncached_query_keys: Vec::new(),
            max_age_ms: None,
            buster: String::new(),
            persist_throttle_ms: 1_000,
            storage_prefix: "query:".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_ms.map(Duration::from_millis)
    }

    pub fn persist_throttle(&self) -> Duration {
        Duration::from_millis(self.persist_throttle_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gateway.cirrus.example".to_string(),
            api_key: None,
            request_timeout_ms: 30_000,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Which logout strategy the shell uses.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKind {
    /// Native wrapper: logout restarts the client process.
    #[default]
    Desktop,
    /// Browser tab: logout navigates to the login view.
    Browser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.presence.tick(), Duration::from_secs(1));
        assert_eq!(config.presence.throttle(), Duration::from_secs(15));
        assert_eq!(config.watchdog.interval(), Duration::from_secs(60));
        assert_eq!(config.session.public_link_markers, vec!["/f/", "/d/"]);
        assert!(config.cache.max_age().is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            deployment = "browser"

            [presence]
            throttle_ms = 5000

            [cache]
            uncached_query_keys = ["notes", "chats"]
        "#;
        let config: ShellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.deployment, DeploymentKind::Browser);
        assert_eq!(config.presence.throttle_ms, 5_000);
        assert_eq!(config.presence.tick_ms, 1_000);
        assert_eq!(config.cache.uncached_query_keys, vec!["notes", "chats"]);
        assert_eq!(config.session.login_path, "/login");
    }
}
