//! Durable key-value storage for store snapshots.
//!
//! Each store persists a projection of its state under a fixed key. Values
//! are JSON wrapped in a versioned envelope:
//!
//! ```json
//! { "state": { "cartItems": [] }, "version": 0 }
//! ```
//!
//! Only the projection is written, never loading flags or error messages.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key for the cart snapshot.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Storage key for the wishlist snapshot.
pub const WISHLIST_STORAGE_KEY: &str = "wishlist-storage";

/// Storage key for the session token pair.
pub const AUTH_STORAGE_KEY: &str = "auth-tokens";

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 0;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Versioned snapshot envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub state: T,
    pub version: u32,
}

impl<T> Snapshot<T> {
    /// Wrap a state projection at the current version.
    pub const fn new(state: T) -> Self {
        Self {
            state,
            version: SNAPSHOT_VERSION,
        }
    }
}

/// String key-value storage that survives restarts.
pub trait LocalStorage: Send + Sync {
    /// Read a raw value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a raw value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Load and decode a snapshot, returning `None` when the key is absent.
///
/// # Errors
///
/// Returns `StorageError` if the value cannot be read or decoded.
pub fn load_snapshot<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };

    let snapshot: Snapshot<T> = serde_json::from_str(&raw)?;
    if snapshot.version != SNAPSHOT_VERSION {
        tracing::warn!(
            key,
            found = snapshot.version,
            expected = SNAPSHOT_VERSION,
            "Snapshot version mismatch, loading anyway"
        );
    }
    Ok(Some(snapshot.state))
}

/// Encode and write a snapshot.
///
/// # Errors
///
/// Returns `StorageError` if the value cannot be encoded or written.
pub fn save_snapshot<T: Serialize>(
    storage: &dyn LocalStorage,
    key: &str,
    state: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(&Snapshot::new(state))?;
    storage.set_item(key, &raw)
}

// =============================================================================
// FileStorage
// =============================================================================

/// One JSON file per key inside a data directory.
///
/// Writes go to a temporary sibling and are renamed into place, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory backing this storage.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let write = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp, &path)
        };

        write().map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage, used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "shopfront-storage-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_snapshot_envelope_format() {
        let storage = MemoryStorage::new();
        save_snapshot(&storage, "counter", &Counter { count: 3 }).unwrap();
        assert_eq!(
            storage.get_item("counter").unwrap().as_deref(),
            Some(r#"{"state":{"count":3},"version":0}"#)
        );
        let loaded: Option<Counter> = load_snapshot(&storage, "counter").unwrap();
        assert_eq!(loaded, Some(Counter { count: 3 }));
    }

    #[test]
    fn test_load_snapshot_missing_key() {
        let storage = MemoryStorage::new();
        let loaded: Option<Counter> = load_snapshot(&storage, "nothing").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_snapshot_corrupt_value() {
        let storage = MemoryStorage::new();
        storage.set_item("counter", "{not json").unwrap();
        let result: Result<Option<Counter>, _> = load_snapshot(&storage, "counter");
        assert!(matches!(result, Err(StorageError::Serialize(_))));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = temp_dir("reopen");
        {
            let storage = FileStorage::open(&dir).unwrap();
            save_snapshot(&storage, CART_STORAGE_KEY, &Counter { count: 9 }).unwrap();
        }

        let storage = FileStorage::open(&dir).unwrap();
        let loaded: Option<Counter> = load_snapshot(&storage, CART_STORAGE_KEY).unwrap();
        assert_eq!(loaded, Some(Counter { count: 9 }));
        assert!(!dir.join("cart-storage.json.tmp").exists());

        storage.remove_item(CART_STORAGE_KEY).unwrap();
        assert!(storage.get_item(CART_STORAGE_KEY).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = temp_dir("keys");
        let storage = FileStorage::open(&dir).unwrap();
        assert!(matches!(
            storage.set_item("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.get_item(""),
            Err(StorageError::InvalidKey(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
