//! Configuration service implementation.
//!
//! Loads `ShellConfig` from `config.toml`, writing a default file on first
//! run, and caches the result.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use cirrus_core::config::ShellConfig;
use cirrus_core::error::{CirrusError, Result};

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ShellConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ShellConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| CirrusError::internal(format!("Config lock poisoned: {}", e)))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_or_create()?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|e| CirrusError::internal(format!("Config lock poisoned: {}", e)))?;
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Saves the configuration atomically and refreshes the cache.
    pub fn save(&self, config: &ShellConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(config.clone());
        }
        Ok(())
    }

    fn load_or_create(&self) -> Result<ShellConfig> {
        if !self.path.exists() {
            tracing::info!("[Config] Creating default config at {:?}", self.path);
            let config = ShellConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ShellConfig::default());
        }
        let config: ShellConfig = toml::from_str(&content)
            .map_err(|e| CirrusError::config(format!("{}: {}", self.path.display(), e)))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::config::DeploymentKind;
    use tempfile::TempDir;

    #[test]
    fn test_creates_default_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let service = ConfigService::new(&path);

        let config = service.get_config().unwrap();
        assert_eq!(config, ShellConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_reads_existing_file_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "deployment = \"browser\"\n").unwrap();
        let service = ConfigService::new(&path);
        assert_eq!(service.get_config().unwrap().deployment, DeploymentKind::Browser);

        fs::write(&path, "deployment = \"desktop\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().deployment, DeploymentKind::Browser);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().deployment, DeploymentKind::Desktop);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "presence = 3").unwrap();
        let err = ConfigService::new(&path).get_config().unwrap_err();
        assert!(err.is_config());
    }
}
