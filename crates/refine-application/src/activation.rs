//! Context activation and the injection policy.
//!
//! A document context (tab, frame, embedded view) is activated at most once;
//! the registry is the idempotency marker for the collaborator that performs
//! the actual injection. Whether a context should be activated at all is the
//! injection policy's call: development hosts are skipped, and once the user
//! curates a custom allowlist it narrows activation to allowlisted plus
//! well-known hosts.

use refine_infrastructure::KeyValueStore;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Hostname fragments that identify development or loopback pages.
const SKIP_PATTERNS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", ".local"];

/// Hosts that stay activatable even when a custom allowlist is configured.
const DEFAULT_HOSTS: [&str; 12] = [
    "claude.ai",
    "perplexity.ai",
    "chatgpt.com",
    "chat.openai.com",
    "gemini.google.com",
    "grok.com",
    "google.com",
    "bing.com",
    "duckduckgo.com",
    "github.com",
    "stackoverflow.com",
    "reddit.com",
];

/// Store key holding the user-curated site allowlist.
const ALLOWLIST_KEY: &str = "custom_websites";

/// Idempotent "already active" marker, one slot per document context.
///
/// Re-activating an active context is a no-op; the caller uses the boolean
/// to decide whether to run its injection work.
#[derive(Debug, Default)]
pub struct ActivationRegistry {
    active: Mutex<HashSet<String>>,
}

impl ActivationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `context` active. Returns `true` only on the first activation.
    pub fn activate(&self, context: &str) -> bool {
        self.active.lock().unwrap().insert(context.to_string())
    }

    pub fn is_active(&self, context: &str) -> bool {
        self.active.lock().unwrap().contains(context)
    }

    /// Forget a context, e.g. when its page unloads.
    pub fn deactivate(&self, context: &str) {
        self.active.lock().unwrap().remove(context);
    }
}

/// Decides whether a page should get an engine instance.
pub struct InjectionPolicy {
    store: Arc<dyn KeyValueStore>,
}

impl InjectionPolicy {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether `url` should be activated.
    ///
    /// Non-web schemes and development hosts never activate. With an empty
    /// allowlist every remaining host activates; a non-empty allowlist
    /// narrows activation to allowlisted hosts plus the well-known defaults.
    pub async fn should_activate(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        if SKIP_PATTERNS.iter().any(|pattern| host.contains(pattern)) {
            return false;
        }

        let allowlist = self.custom_sites().await;
        if allowlist.is_empty() {
            return true;
        }
        let custom_hit = allowlist
            .iter()
            .any(|site| host.contains(site.as_str()) || site.contains(&host));
        let default_hit = DEFAULT_HOSTS.iter().any(|site| host.contains(site));
        custom_hit || default_hit
    }

    /// The persisted allowlist. Storage faults degrade to empty.
    pub async fn custom_sites(&self) -> Vec<String> {
        match self.store.get(ALLOWLIST_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable site allowlist, treating as empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to load site allowlist");
                Vec::new()
            }
        }
    }

    /// Persist `sites` as the new allowlist, replacing the previous one.
    pub async fn set_custom_sites(&self, sites: &[String]) -> refine_core::Result<()> {
        self.store.set(ALLOWLIST_KEY, json!(sites)).await
    }
}

/// The lowercased hostname of an http(s) URL, without credentials or port.
fn host_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority
        .rsplit('@')
        .next()?
        .split(':')
        .next()?
        .to_lowercase();
    if host.is_empty() { None } else { Some(host) }
}
