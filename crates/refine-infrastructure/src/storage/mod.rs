//! Storage layer: atomic files, the key-value store, and the secret file.

pub mod atomic_json;
pub mod kv;
pub mod secret_storage;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreEvent};
pub use secret_storage::{SecretStorage, SecretStorageError};
