use crate::error::{Result, TrackerError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";
pub const OPERARIO_KEY: &str = "operario";

/// Every key owned by a session, removed together on teardown
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, OPERARIO_KEY];

/// Synchronous string key-value storage for session data
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries so that readers never observe a partial update
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.replace(entries, &[])
    }

    /// Write `entries` and drop `stale` keys in one step.
    ///
    /// The default writes before it removes, so a failed write leaves the
    /// stale keys in place. Backends with a single lock override this to
    /// apply both halves together.
    fn replace(&self, entries: &[(&str, &str)], stale: &[&str]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        for key in stale {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// In-process store, used by tests and short-lived embeddings
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| TrackerError::StorageError("Memory store lock poisoned".to_string()))
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        self.lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl SessionStore for MemoryStore {
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

    fn replace(&self, entries: &[(&str, &str)], stale: &[&str]) -> Result<()> {
        let mut map = self.lock()?;
        for key in stale {
            map.remove(*key);
        }
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// JSON-file store, one file per backend
/// Stored in <data dir>/jornada/sessions/
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Store for the session against `base_url`
    pub fn for_api(base_url: &str) -> Result<Self> {
        let sessions_dir = dirs::data_local_dir()
            .ok_or_else(|| {
                TrackerError::StorageError("Could not determine data directory".to_string())
            })?
            .join("jornada")
            .join("sessions");

        Self::new(sessions_dir.join(format!("{}.json", Self::file_key(base_url))))
    }

    /// SHA-256 of the normalised base URL
    fn file_key(base_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(base_url.trim_end_matches('/').as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| TrackerError::StorageError(format!("Failed to read session file: {}", e)))?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path).map_err(|e| {
                    TrackerError::StorageError(format!("Failed to remove session file: {}", e))
                })?;
            }
            return Ok(());
        }

        let json = serde_json::to_string_pretty(entries)?;

        // Write-then-rename so a crash never leaves half a token pair behind
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| TrackerError::StorageError(format!("Failed to write session file: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| TrackerError::StorageError(format!("Failed to replace session file: {}", e)))?;

        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| TrackerError::StorageError("Session file lock poisoned".to_string()))?;

        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn replace(&self, pairs: &[(&str, &str)], stale: &[&str]) -> Result<()> {
        self.update(|entries| {
            for key in stale {
                entries.remove(*key);
            }
            for (key, value) in pairs {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }
}
