//! Infrastructure layer: persistence and host-document implementations.
//!
//! Everything here implements a seam declared in `refine-core`: the
//! key-value store backing session persistence and the allowlist, the secret
//! file holding the API credential, and an in-memory host document for tests
//! and headless embedding.

pub mod memory_document;
pub mod paths;
pub mod session_repository;
pub mod storage;

pub use crate::memory_document::MemoryDocument;
pub use crate::session_repository::KvSessionRepository;
pub use crate::storage::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SecretStorage, StoreEvent,
};
