//! Remote-service constants and size-tiered generation parameters.

use std::time::Duration;

/// The model used for text refinement.
pub const DEFAULT_MODEL: &str = "gemma-3-27b-it";

/// Base URL of the generateContent endpoint family.
pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Above this many characters the compact prompt template is used.
pub const COMPACT_PROMPT_THRESHOLD: usize = 2_000;

/// Deadline and output budget for one request, chosen by input size.
///
/// Bigger inputs get a longer deadline and a larger output budget so the
/// model can return the whole rewritten text; there is no retry, so the
/// deadline is the only backstop against a hung request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationProfile {
    pub deadline: Duration,
    pub max_output_tokens: u32,
}

impl GenerationProfile {
    /// The profile for `text`, by character count.
    pub fn for_text(text: &str) -> Self {
        let chars = text.chars().count();
        let (deadline_secs, max_output_tokens) = if chars <= COMPACT_PROMPT_THRESHOLD {
            (15, 1024)
        } else if chars < 10_000 {
            (30, 2048)
        } else if chars < 100_000 {
            (60, 4096)
        } else {
            (120, 8192)
        };
        Self {
            deadline: Duration::from_secs(deadline_secs),
            max_output_tokens,
        }
    }

    pub fn deadline_secs(&self) -> u64 {
        self.deadline.as_secs()
    }
}
