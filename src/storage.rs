//! Durable key-value state port
//!
//! The timer persists two independent JSON records: its state and its
//! settings. Storage is last-write-wins and strictly best-effort; a missing
//! or failing backend degrades to in-memory defaults and never surfaces as
//! an error to the state machine.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Storage key for the persisted timer state record
pub const TIMER_STATE_KEY: &str = "rest-timer-state";

/// Storage key for the persisted timer settings record
pub const TIMER_SETTINGS_KEY: &str = "rest-timer-settings";

/// Durable key-value store with get/set semantics over JSON strings
pub trait KvStore: Send {
    /// Fetch the raw value for a key, `None` if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Write the raw value for a key
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KvStore + Sync> KvStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Load and deserialize a record, falling back to `None` on any failure
pub fn load_record<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding unreadable record for key {}: {}", key, e);
            None
        }
    }
}

/// Serialize and persist a record, logging instead of propagating failures
pub fn save_record<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => {
            if let Err(e) = store.set(key, &raw) {
                warn!("Failed to persist record for key {}: {}", key, e);
            }
        }
        Err(e) => warn!("Failed to serialize record for key {}: {}", key, e),
    }
}

/// Volatile store used when no state directory is configured, and in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry, used to model pre-existing persisted state
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store lock poisoned: {}", e))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store keeping one JSON file per key under a state directory
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
