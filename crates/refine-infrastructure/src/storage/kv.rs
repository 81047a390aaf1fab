//! The persistent key-value store.
//!
//! The engine treats persistence as a flat string-keyed JSON store: session
//! records (`session:<uuid>`), the `current_optimization` pointer, and the
//! custom-surface allowlist all live here. Writes are observable through a
//! broadcast channel so collaborators (settings surfaces, other contexts)
//! can react to changes without polling.

use crate::storage::atomic_json::AtomicJsonFile;
use refine_core::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Capacity of the change-notification channel. Slow subscribers lag, they
/// never block writers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A change observed on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Set { key: String },
    Removed { key: String },
}

/// Flat string-keyed persistent store with change notification.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Set `key` to `value`, creating or replacing it.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Every key currently present, in sorted order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// In-memory store for tests and ephemeral contexts.
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Value>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(BTreeMap::new()),
            events,
        }
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| refine_core::RefineError::storage("store mutex poisoned"))?
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| refine_core::RefineError::storage("store mutex poisoned"))?
            .insert(key.to_string(), value);
        let _ = self.events.send(StoreEvent::Set {
            key: key.to_string(),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = self
            .entries
            .lock()
            .map_err(|_| refine_core::RefineError::storage("store mutex poisoned"))?
            .remove(key)
            .is_some();
        if removed {
            let _ = self.events.send(StoreEvent::Removed {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| refine_core::RefineError::storage("store mutex poisoned"))?
            .keys()
            .cloned()
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// File-backed store over one atomic JSON document.
///
/// The whole store is a single `BTreeMap<String, Value>` serialized to
/// `state.json`; every mutation goes through the locked read-modify-write
/// cycle of [`AtomicJsonFile::update`]. The data volume here is tiny (a few
/// session records and an allowlist), so rewriting the file per mutation is
/// the simple and correct choice.
pub struct FileKeyValueStore {
    file: AtomicJsonFile<BTreeMap<String, Value>>,
    events: broadcast::Sender<StoreEvent>,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            file: AtomicJsonFile::new(path),
            events,
        }
    }

    fn load_entries(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.file.load()?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load_entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.file.update(BTreeMap::new(), |entries| {
            entries.insert(key.to_string(), value);
            Ok(())
        })?;
        let _ = self.events.send(StoreEvent::Set {
            key: key.to_string(),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut removed = false;
        self.file.update(BTreeMap::new(), |entries| {
            removed = entries.remove(key).is_some();
            Ok(())
        })?;
        if removed {
            let _ = self.events.send(StoreEvent::Removed {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load_entries()?.keys().cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryKeyValueStore::new();
        store.set("alpha", json!({"n": 1})).await.unwrap();
        assert_eq!(store.get("alpha").await.unwrap(), Some(json!({"n": 1})));
        assert_eq!(store.get("beta").await.unwrap(), None);

        store.remove("alpha").await.unwrap();
        assert_eq!(store.get("alpha").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_notifies_subscribers() {
        let store = MemoryKeyValueStore::new();
        let mut events = store.subscribe();

        store.set("alpha", json!(1)).await.unwrap();
        store.remove("alpha").await.unwrap();
        // Removing an absent key emits nothing.
        store.remove("alpha").await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Set {
                key: "alpha".into()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Removed {
                key: "alpha".into()
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn file_store_persists_across_handles() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        let store = FileKeyValueStore::new(path.clone());
        store.set("session:abc", json!({"url": "https://example.com"})).await.unwrap();
        store.set("current_optimization", json!("abc")).await.unwrap();

        let reopened = FileKeyValueStore::new(path);
        assert_eq!(
            reopened.get("current_optimization").await.unwrap(),
            Some(json!("abc"))
        );
        assert_eq!(
            reopened.keys().await.unwrap(),
            vec!["current_optimization".to_string(), "session:abc".to_string()]
        );
    }

    #[tokio::test]
    async fn file_store_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().join("state.json"));

        store.set("k", json!(true)).await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
