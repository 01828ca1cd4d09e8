use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::store::StoreError;

/// Local key-value storage the post blob lives in. Reads distinguish
/// "absent" from "unreadable"; writes are all-or-nothing per key.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key under a root directory, created on first write.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Write {
            path: self.root.clone(),
            source,
        })?;
        let path = self.key_path(key);
        fs::write(&path, value).map_err(|source| StoreError::Write { path, source })
    }
}

/// In-memory backend, with an optional per-value byte quota so callers can
/// exercise the quota-exceeded write path the way a browser storage quota
/// would surface it.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota_bytes {
            if value.len() > limit {
                return Err(StoreError::QuotaExceeded { limit });
            }
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
