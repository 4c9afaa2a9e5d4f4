//! Opaque key/string persistence used by every aggregator.
//!
//! Each aggregator keeps one JSON document under a fixed key. Reads tolerate
//! missing or corrupt documents by falling back to an empty default, and
//! writes are best-effort: a failed write is logged and the in-memory state
//! stays authoritative for the rest of the session.

use crate::config;
use crate::error::{Result, RivalsError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A string-keyed store of string values.
pub trait KeyValueStore: Send + Sync {
    /// Return the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Stores one file per key inside a directory.
pub struct FileStore {
    /// Directory holding the stored documents.
    pub dir: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `dir`.
    ///
    /// If `dir` is `None`, uses the platform-appropriate data directory.
    /// Creates the directory if it does not exist.
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let dir = dir.unwrap_or_else(config::default_storage_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// File for `key`. Bytes outside `[A-Za-z0-9._-]` are percent-escaped,
    /// `%` included, so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_') {
                file.push(char::from(byte));
            } else {
                file.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{file}.json"))
    }

    /// Remove every stored document and recreate the directory.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Writes to a temp file first and renames on success, so an interrupted
    /// write never leaves a truncated document behind.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let dest = self.path_for(key);
        let tmp_dest = dest.with_extension("json.tmp");
        let result = write_then_rename(&tmp_dest, &dest, value);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_dest);
        }
        result
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn write_then_rename(tmp: &Path, dest: &Path, value: &str) -> Result<()> {
    fs::write(tmp, value)?;
    fs::rename(tmp, dest)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store, used when no storage directory is wanted.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| RivalsError::InvalidArgument("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Load and parse the JSON document under `key`.
///
/// A missing document yields `T::default()`. A corrupt document is removed
/// so the next write starts clean, and also yields the default.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read stored document");
            return T::default();
        }
    };
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupt stored document -- removing");
            let _ = store.remove(key);
            T::default()
        }
    }
}

/// Serialize `value` and store it under `key`. Failures are logged, not
/// returned.
pub fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T)
where
    T: Serialize + ?Sized,
{
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to encode document");
            return;
        }
    };
    if let Err(e) = store.set(key, &encoded) {
        tracing::warn!(key, error = %e, "failed to persist document");
    }
}

/// Remove `key`, logging rather than returning any failure.
pub fn remove_key(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove stored document");
    }
}
