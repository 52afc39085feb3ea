//! Persisted key/value storage for session and cached application data.
//!
//! Values are opaque strings, like browser local storage. [`MemoryStorage`]
//! keeps them in process; [`FileStorage`] mirrors every mutation into a
//! single JSON object on disk so a session survives restarts.

use crate::errors::{ApiError, ApiResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_INFO_KEY: &str = "user_info";
/// Whole session snapshot as one JSON document.
pub const SESSION_STATE_KEY: &str = "auth-storage";

/// Keys written by the session store.
pub const SESSION_KEYS: [&str; 4] = [
    SESSION_STATE_KEY,
    AUTH_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USER_INFO_KEY,
];

/// Cached application data that must not outlive a login session.
pub const APP_DATA_KEYS: [&str; 6] = [
    "projects",
    "tasks",
    "notifications",
    "tags",
    "user_settings",
    "cached_data",
];

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> ApiResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ApiResult<()>;

    fn remove(&self, key: &str) -> ApiResult<()>;

    fn remove_many(&self, keys: &[&str]) -> ApiResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// In-process storage; every instance starts empty.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Storage persisted as one JSON object file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the file at `path`, starting empty when it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                ApiError::storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    ApiError::storage(format!("Corrupt storage file {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened storage {} with {} entries", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ApiError::storage(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| ApiError::storage(format!("Failed to encode storage: {}", e)))?;
        fs::write(&self.path, content).map_err(|e| {
            ApiError::storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Entries only change in memory once the file has been written.
    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> ApiResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        apply(&mut next);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn remove_many(&self, keys: &[&str]) -> ApiResult<()> {
        self.mutate(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
