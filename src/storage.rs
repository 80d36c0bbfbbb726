//! Scoped string storage.
//!
//! The consent record and the session identifier each live under one key.
//! Storage is best-effort: callers treat every error as "not available".

use crate::error::StorageError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A key/value store bound to one scope (tab, browser profile, data dir).
pub trait ScopedStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Clones share the same scope.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| StorageError::Io {
            operation: "lock".to_string(),
            reason: "poisoned".to_string(),
        })
    }
}

impl ScopedStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage that behaves like a browser with storage disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStorage;

impl ScopedStorage for DisabledStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Disabled)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }
}

/// A JSON object on disk, one file per scope.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    guard: Arc<Mutex<()>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Storage file under the platform's local data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrybe")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| io_error("read", e))?;
        serde_json::from_str(&content).map_err(|e| io_error("parse", e))
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create_dir", e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| io_error("serialize", e))?;
        std::fs::write(&self.path, json).map_err(|e| io_error("write", e))
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.guard.lock().map_err(|_| io_error("lock", "poisoned"))?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl ScopedStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().map_err(|_| io_error("lock", "poisoned"))?;
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

fn io_error(operation: &str, reason: impl std::fmt::Display) -> StorageError {
    StorageError::Io {
        operation: operation.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_shares_scope_across_clones() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap(), Some("v".to_string()));

        other.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_disabled_storage_always_fails() {
        let storage = DisabledStorage;
        assert_eq!(storage.get("k"), Err(StorageError::Disabled));
        assert_eq!(storage.set("k", "v"), Err(StorageError::Disabled));
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("scrybe-storage-{}", uuid::Uuid::new_v4()))
            .join("storage.json");
        let storage = FileStorage::new(&path);

        assert_eq!(storage.get("missing").unwrap(), None);
        storage.set("scrybe_consent", "1").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("scrybe_consent").unwrap(), Some("1".to_string()));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
