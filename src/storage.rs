//! Persistent blob store used to mirror the cart across restarts.
//!
//! The store only ever touches a single fixed key ([`CART_STORAGE_KEY`]); the
//! medium itself is treated as an opaque string key/value store. Two
//! implementations are provided: a JSON file ([`JsonFileStore`]) and an
//! in-memory map ([`MemoryStore`]) for tests and ephemeral use.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

/// Fixed namespace key under which the serialized cart lives.
pub const CART_STORAGE_KEY: &str = "cart-storage-key";

/// Errors that can occur reading or writing the blob store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing file does not hold a valid key/value map.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Opaque persisted key/value store.
///
/// `set` overwrites unconditionally; `get` returns `None` for absent keys.
pub trait BlobStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read or decoded.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Blob store backed by a single JSON file holding a key/value map.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`. The file is created on
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // A file that no longer decodes is discarded on the next write; set
        // overwrites unconditionally.
        let mut map = match self.load() {
            Ok(map) => map,
            Err(StorageError::Serialize(_)) => HashMap::new(),
            Err(e) => return Err(e),
        };
        map.insert(key.to_string(), value.to_string());
        fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        Ok(())
    }
}

/// In-memory blob store.
///
/// Clones share the same underlying map, so a test can keep a handle to the
/// store it handed to the cart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
