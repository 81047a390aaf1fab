//! Engine configuration and secret (credential) model.
//!
//! Two build variants exist in the wild: the generous one accepts selections
//! up to 500,000 characters, the compact one stops at 8,000. Everything else
//! is shared; both are expressed as presets over the same struct.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable limits and delays for the selection-to-replacement pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Selections at or above this many characters are rejected outright.
    pub max_selection_chars: usize,
    /// Selections shorter than this that make up the entire surface content
    /// are treated as deletion-gesture noise and suppressed.
    pub min_meaningful_selection: usize,
    /// Texts longer than this get the compact prompt and larger budgets.
    pub large_text_threshold: usize,
    /// Settle time before re-running classification on a selection event.
    pub selection_debounce: Duration,
    /// Window after closing during which new selections are ignored.
    pub close_cooldown: Duration,
    /// Delay before verifying that a surface accepted a programmatic write.
    pub settle_delay: Duration,
}

impl EngineConfig {
    /// The generous build variant: half-million character ceiling.
    pub fn generous() -> Self {
        Self {
            max_selection_chars: 500_000,
            min_meaningful_selection: 10,
            large_text_threshold: 2_000,
            selection_debounce: Duration::from_millis(30),
            close_cooldown: Duration::from_millis(500),
            settle_delay: Duration::from_millis(50),
        }
    }

    /// The compact build variant: 8,000 character ceiling.
    pub fn compact() -> Self {
        Self {
            max_selection_chars: 8_000,
            ..Self::generous()
        }
    }

    /// Whether `text` counts as "large" for prompt/budget/messaging purposes.
    pub fn is_large_text(&self, text: &str) -> bool {
        text.chars().count() > self.large_text_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::generous()
    }
}

/// Secret configuration loaded from secret.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Gemini API settings, absent until the user configures a key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiSecret>,
}

/// Gemini-specific secret material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSecret {
    pub api_key: String,
}

impl SecretConfig {
    /// The configured Gemini API key, if any.
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini.as_ref().map(|g| g.api_key.as_str())
    }
}

/// Cheap shape check for a Gemini API key, usable before any network call.
///
/// Google API keys start with `AIza` and are well over 30 characters; a key
/// failing this check is certainly wrong, one passing it may still be.
pub fn looks_like_gemini_key(key: &str) -> bool {
    let key = key.trim();
    key.starts_with("AIza") && key.len() >= 30
}

/// Service for loading secret configuration.
///
/// Implementations must never include secret material in error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration from storage.
    async fn load_secrets(&self) -> Result<SecretConfig>;

    /// Checks whether a secret file exists at all.
    async fn secret_file_exists(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_differ_only_in_ceiling() {
        let generous = EngineConfig::generous();
        let compact = EngineConfig::compact();
        assert_eq!(generous.max_selection_chars, 500_000);
        assert_eq!(compact.max_selection_chars, 8_000);
        assert_eq!(generous.close_cooldown, compact.close_cooldown);
        assert_eq!(generous.min_meaningful_selection, compact.min_meaningful_selection);
    }

    #[test]
    fn large_text_threshold_is_exclusive() {
        let config = EngineConfig::generous();
        assert!(!config.is_large_text(&"x".repeat(2_000)));
        assert!(config.is_large_text(&"x".repeat(2_001)));
    }

    #[test]
    fn gemini_key_shape_check() {
        assert!(looks_like_gemini_key("AIzaSyA1234567890abcdefghijklmnop"));
        assert!(!looks_like_gemini_key("AIza-too-short"));
        assert!(!looks_like_gemini_key("sk-proj-1234567890abcdefghijklmnop"));
        assert!(!looks_like_gemini_key(""));
    }

    #[test]
    fn secret_config_round_trips_without_key() {
        let config = SecretConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SecretConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.gemini_api_key().is_none());
    }
}
