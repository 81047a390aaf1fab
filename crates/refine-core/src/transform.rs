//! The remote transformation seam.

use crate::error::Result;

/// A remote text-transformation service.
///
/// One call, no retries: failures are surfaced to the user, who re-triggers
/// manually. Implementations own their deadline and parameter selection.
#[async_trait::async_trait]
pub trait TransformService: Send + Sync {
    /// Transform `text` and return the replacement candidate, trimmed.
    async fn transform(&self, text: &str) -> Result<String>;
}
