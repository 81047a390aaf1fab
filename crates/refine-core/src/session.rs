//! Transform sessions: one successful transformation result each.
//!
//! A session is created when a transform request succeeds, cached in memory
//! for the current overlay instance, optionally persisted, and destroyed on
//! explicit replacement, explicit clear, or after one hour.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum age of a session before it is discarded.
pub const SESSION_TTL_SECS: i64 = 3600;

/// One successful transformation result.
///
/// The session key is random and distinct from the cache lookup key (the
/// original text) so records from concurrent tabs never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSession {
    pub session_key: Uuid,
    pub original_text: String,
    pub transformed_text: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
}

impl TransformSession {
    pub fn new(
        original_text: impl Into<String>,
        transformed_text: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            session_key: Uuid::new_v4(),
            original_text: original_text.into(),
            transformed_text: transformed_text.into(),
            created_at: Utc::now(),
            source_url: source_url.into(),
        }
    }

    /// Whether the session has outlived its hour.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::seconds(SESSION_TTL_SECS)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Restoration requires the exact page identity, no URL normalization.
    pub fn matches_url(&self, url: &str) -> bool {
        self.source_url == url
    }
}

/// In-memory cache of the current session for one overlay instance.
///
/// At most one session is current for a document context at a time; a lookup
/// for any other text invalidates the cached entry, so a stale result can
/// never be shown for a different selection.
#[derive(Debug, Default)]
pub struct SessionCache {
    current: Option<TransformSession>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `session` the current entry, superseding any previous one.
    pub fn put(&mut self, session: TransformSession) {
        self.current = Some(session);
    }

    /// Exact-string lookup by original text.
    ///
    /// A mismatch clears the in-memory entry and returns `None`.
    pub fn get(&mut self, original_text: &str) -> Option<&TransformSession> {
        match &self.current {
            Some(session) if session.original_text == original_text => self.current.as_ref(),
            Some(_) => {
                self.current = None;
                None
            }
            None => None,
        }
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&TransformSession> {
        self.current.as_ref()
    }
}

/// Persistence for transform sessions across page loads of the same
/// document context.
///
/// Implementations store sessions keyed by session id plus a current-session
/// pointer; restoration is gated on exact URL match and bounded age, never
/// on locking.
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a session and mark it current.
    async fn persist(&self, session: &TransformSession) -> Result<()>;

    /// Restore the current session for `url`, if one exists, matches the URL
    /// exactly and is younger than the TTL.
    async fn restore(&self, url: &str) -> Result<Option<TransformSession>>;

    /// Drop the current-session pointer and its record.
    async fn clear_current(&self) -> Result<()>;

    /// Remove every persisted session older than the TTL. Invoked once per
    /// page load, not on a timer. Returns the number of removed records.
    async fn garbage_collect(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(text: &str) -> TransformSession {
        TransformSession::new(text, format!("{text} (refined)"), "https://example.com")
    }

    #[test]
    fn cache_hit_on_exact_original_text() {
        let mut cache = SessionCache::new();
        cache.put(session("hello"));
        let hit = cache.get("hello").expect("hit");
        assert_eq!(hit.transformed_text, "hello (refined)");
    }

    #[test]
    fn cache_mismatch_clears_entry() {
        let mut cache = SessionCache::new();
        cache.put(session("hello"));
        assert!(cache.get("world").is_none());
        // The previous entry is gone, even for its own key.
        assert!(cache.get("hello").is_none());
    }

    #[test]
    fn session_keys_are_unique() {
        assert_ne!(session("a").session_key, session("a").session_key);
    }

    #[test]
    fn expiry_is_a_strict_one_hour_bound() {
        let s = session("hello");
        let now = s.created_at;
        assert!(!s.is_expired_at(now + Duration::seconds(SESSION_TTL_SECS)));
        assert!(s.is_expired_at(now + Duration::seconds(SESSION_TTL_SECS + 1)));
    }

    #[test]
    fn url_match_is_exact() {
        let s = session("hello");
        assert!(s.matches_url("https://example.com"));
        assert!(!s.matches_url("https://example.com/"));
        assert!(!s.matches_url("https://example.com?tab=1"));
    }
}
