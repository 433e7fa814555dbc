//! Unified path management for cirrus files.
//!
//! ```text
//! ~/.config/cirrus/            # Config directory
//! ├── config.toml              # Shell configuration
//! └── logs/                    # Application logs
//!     └── cirrus-desktop.log.YYYY-MM-DD
//!
//! ~/.local/share/cirrus/       # Data directory
//! ├── local/                   # Local session storage (authenticated flag etc.)
//! └── offline/                 # Durable offline store (query cache)
//! ```

use std::path::PathBuf;

use cirrus_core::error::{CirrusError, Result};

const APP_DIR: &str = "cirrus";

#[derive(Debug, Clone)]
pub struct CirrusPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl CirrusPaths {
    /// Resolves the platform config and data directories.
    pub fn from_platform() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CirrusError::config("Cannot find config directory"))?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CirrusError::config("Cannot find data directory"))?
            .join(APP_DIR);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Places both trees under `root` (tests, portable installs).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    pub fn local_storage_dir(&self) -> PathBuf {
        self.data_dir.join("local")
    }

    pub fn offline_store_dir(&self) -> PathBuf {
        self.data_dir.join("offline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root_layout() {
        let paths = CirrusPaths::with_root("/tmp/cirrus-test");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/cirrus-test/config/config.toml"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/tmp/cirrus-test/config/logs"));
        assert_eq!(paths.offline_store_dir(), PathBuf::from("/tmp/cirrus-test/data/offline"));
        assert_ne!(paths.local_storage_dir(), paths.offline_store_dir());
    }
}
