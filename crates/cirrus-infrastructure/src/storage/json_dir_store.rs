//! Directory-backed key-value store with atomic writes.
//!
//! Each key is one JSON file named after the URL-safe base64 encoding of the
//! key. Keys whose encoding would exceed [`MAX_ENCODED_NAME`] are named
//! `~<sha256 hex>` instead. Every file holds `{"key": ..., "value": ...}` so
//! hashed names can still be listed. Writes go to a temporary file in the same
//! directory, are fsynced, and are then renamed over the target, so a crash
//! never leaves a torn entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cirrus_core::error::{CirrusError, Result};
use cirrus_core::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";
const HASHED_PREFIX: char = '~';

/// Longest base64 file stem used verbatim; well under the usual 255-byte limit.
pub const MAX_ENCODED_NAME: usize = 120;

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    value: Value,
}

pub struct JsonDirStore {
    root: PathBuf,
    write_seq: AtomicU64,
}

impl JsonDirStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            write_seq: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_stem(key: &str) -> String {
        let encoded = URL_SAFE_NO_PAD.encode(key.as_bytes());
        if encoded.len() <= MAX_ENCODED_NAME {
            return encoded;
        }
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{}{}", HASHED_PREFIX, hex::encode(hasher.finalize()))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::file_stem(key), ENTRY_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        let name = Self::file_stem(key);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!(".{}.{}.{}", name, seq, TEMP_EXTENSION))
    }

    fn is_entry(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
    }

    fn decode_key(path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;
        let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Recovers the key of an entry file, reading the body for hashed names.
    async fn entry_key(path: &Path) -> Result<Option<String>> {
        let hashed = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.starts_with(HASHED_PREFIX));
        if !hashed {
            return Ok(Self::decode_key(path));
        }
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<StoredEntry>(&content) {
            Ok(entry) => Ok(Some(entry.key)),
            Err(e) => {
                tracing::warn!("[Storage] Skipping unreadable entry {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    async fn list_entries(&self) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

#[async_trait]
impl KeyValueStore for JsonDirStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let content = match fs::read(self.entry_path(key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: StoredEntry = serde_json::from_slice(&content)?;
        if entry.key != key {
            return Err(CirrusError::storage(format!(
                "Entry for '{}' holds key '{}'",
                key, entry.key
            )));
        }
        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let bytes = serde_json::to_vec(&StoredEntry {
            key: key.to_string(),
            value,
        })?;
        let tmp_path = self.temp_path(key);

        let mut tmp_file = fs::File::create(&tmp_path).await?;
        tmp_file.write_all(&bytes).await?;
        tmp_file.sync_all().await?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, self.entry_path(key)).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CirrusError::storage(format!(
                "Failed to commit '{}': {}",
                key, e
            )));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for path in self.list_entries().await? {
            if !Self::is_entry(&path) {
                continue;
            }
            if let Some(key) = Self::entry_key(&path).await? {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        for path in self.list_entries().await? {
            let owned = path
                .extension()
                .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == TEMP_EXTENSION);
            if !owned {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
