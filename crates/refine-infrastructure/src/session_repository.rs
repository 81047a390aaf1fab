//! Key-value-store backed persistence for transform sessions.
//!
//! Layout: each session lives under `session:<uuid>`, and the key
//! `current_optimization` points at the uuid of the session that should be
//! offered for restoration on the next page load.

use crate::storage::KeyValueStore;
use refine_core::Result;
use refine_core::session::{SessionRepository, TransformSession};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix shared by all persisted session records.
const SESSION_KEY_PREFIX: &str = "session:";
/// Pointer to the uuid of the current session.
const CURRENT_POINTER_KEY: &str = "current_optimization";

fn record_key(session_key: &uuid::Uuid) -> String {
    format!("{SESSION_KEY_PREFIX}{session_key}")
}

/// [`SessionRepository`] over any [`KeyValueStore`].
pub struct KvSessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvSessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The uuid the current-session pointer names, if the pointer exists and
    /// is well formed. A malformed pointer is dropped.
    async fn current_pointer(&self) -> Result<Option<String>> {
        match self.store.get(CURRENT_POINTER_KEY).await? {
            Some(serde_json::Value::String(id)) => Ok(Some(id)),
            Some(other) => {
                warn!(value = %other, "dropping malformed current-session pointer");
                self.store.remove(CURRENT_POINTER_KEY).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl SessionRepository for KvSessionRepository {
    async fn persist(&self, session: &TransformSession) -> Result<()> {
        let record = serde_json::to_value(session)?;
        self.store
            .set(&record_key(&session.session_key), record)
            .await?;
        self.store
            .set(CURRENT_POINTER_KEY, json!(session.session_key.to_string()))
            .await?;
        debug!(session_key = %session.session_key, "persisted transform session");
        Ok(())
    }

    async fn restore(&self, url: &str) -> Result<Option<TransformSession>> {
        let Some(id) = self.current_pointer().await? else {
            return Ok(None);
        };
        let key = format!("{SESSION_KEY_PREFIX}{id}");
        let Some(record) = self.store.get(&key).await? else {
            // Dangling pointer, e.g. after an interrupted clear.
            self.store.remove(CURRENT_POINTER_KEY).await?;
            return Ok(None);
        };
        let session: TransformSession = match serde_json::from_value(record) {
            Ok(session) => session,
            Err(e) => {
                warn!(key = %key, error = %e, "dropping unreadable session record");
                self.store.remove(&key).await?;
                self.store.remove(CURRENT_POINTER_KEY).await?;
                return Ok(None);
            }
        };
        if session.is_expired() {
            self.store.remove(&key).await?;
            self.store.remove(CURRENT_POINTER_KEY).await?;
            return Ok(None);
        }
        if !session.matches_url(url) {
            // The record may still be current for its own page; leave it.
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn clear_current(&self) -> Result<()> {
        if let Some(id) = self.current_pointer().await? {
            self.store
                .remove(&format!("{SESSION_KEY_PREFIX}{id}"))
                .await?;
        }
        self.store.remove(CURRENT_POINTER_KEY).await
    }

    async fn garbage_collect(&self) -> Result<usize> {
        let pointer = self.current_pointer().await?;
        let mut removed = 0;
        for key in self.store.keys().await? {
            let Some(id) = key.strip_prefix(SESSION_KEY_PREFIX) else {
                continue;
            };
            let stale = match self.store.get(&key).await? {
                Some(record) => match serde_json::from_value::<TransformSession>(record) {
                    Ok(session) => session.is_expired(),
                    Err(_) => true,
                },
                None => continue,
            };
            if stale {
                self.store.remove(&key).await?;
                removed += 1;
                if pointer.as_deref() == Some(id) {
                    self.store.remove(CURRENT_POINTER_KEY).await?;
                }
            }
        }
        if removed > 0 {
            debug!(removed, "collected expired transform sessions");
        }
        Ok(removed)
    }
}
