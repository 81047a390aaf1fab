//! The replacement engine.
//!
//! Re-inserts a transformed text into the owning surface while preserving
//! the cursor and the host page's framework reactivity. The document is
//! adversarial: the surface may have been detached, replaced, focus-trapped
//! or flipped read-only since the selection was captured, so every step is
//! defensive and every failure path ends in the clipboard rather than a
//! silent loss of the user's result.

use crate::config::EngineConfig;
use crate::document::{CHANGE_NOTIFICATION_SEQUENCE, HostDocument, SyntheticEvent};
use crate::error::RefineError;
use crate::surface::{
    ElementDescriptor, HostHints, SurfaceRef, aggressive_candidates, find_candidates,
};
use tracing::{debug, warn};

/// How the new text was spliced into the surface content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// The original text was found verbatim; its first occurrence was
    /// replaced. When it occurs more than once this is a known ambiguity:
    /// first occurrence wins, by design.
    FirstOccurrence { occurrences: usize },
    /// The captured selection offsets were still valid and were used.
    CapturedOffsets,
    /// Nothing matched; the whole surface content was replaced.
    WholeContent,
}

/// Result of a replacement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementOutcome {
    /// The surface now holds the new content; the caret sits at `cursor`
    /// (character offset, immediately after the inserted text).
    Applied {
        surface: SurfaceRef,
        cursor: usize,
        substitution: Substitution,
    },
    /// No surface would accept the edit; the text went to the clipboard.
    CopiedToClipboard,
    /// Even the clipboard fallback failed.
    Failed { reason: RefineError },
}

/// Compute the new surface content and caret position.
///
/// Strategy order: first exact-substring occurrence of `original`, then the
/// captured selection offsets (character-based) if still in range, then
/// whole-content replacement. Pure; character offsets are used for the caret
/// so hosts with UTF-16 or grapheme-based carets can convert at the seam.
pub fn plan_substitution(
    content: &str,
    original: &str,
    captured_offsets: Option<(usize, usize)>,
    replacement: &str,
) -> (String, usize, Substitution) {
    let replacement_chars = replacement.chars().count();

    if let Some(byte_idx) = content.find(original) {
        let mut next = String::with_capacity(content.len() + replacement.len());
        next.push_str(&content[..byte_idx]);
        next.push_str(replacement);
        next.push_str(&content[byte_idx + original.len()..]);
        let cursor = content[..byte_idx].chars().count() + replacement_chars;
        let occurrences = content.matches(original).count();
        return (next, cursor, Substitution::FirstOccurrence { occurrences });
    }

    let content_chars = content.chars().count();
    if let Some((start, end)) = captured_offsets
        && start <= end
        && end <= content_chars
    {
        let prefix: String = content.chars().take(start).collect();
        let suffix: String = content.chars().skip(end).collect();
        let next = format!("{prefix}{replacement}{suffix}");
        return (
            next,
            start + replacement_chars,
            Substitution::CapturedOffsets,
        );
    }

    (
        replacement.to_string(),
        replacement_chars,
        Substitution::WholeContent,
    )
}

/// Drives the full substitution algorithm against a host document.
pub struct ReplacementEngine {
    config: EngineConfig,
    hints: HostHints,
}

impl ReplacementEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            hints: HostHints::defaults(),
        }
    }

    pub fn with_hints(mut self, hints: HostHints) -> Self {
        self.hints = hints;
        self
    }

    /// Replace `original` with `replacement` in (or near) `surface`.
    ///
    /// DOM-level failures degrade to the clipboard fallback; only a clipboard
    /// failure yields `Failed`.
    pub async fn replace(
        &self,
        doc: &dyn HostDocument,
        surface: Option<&SurfaceRef>,
        original: &str,
        replacement: &str,
    ) -> ReplacementOutcome {
        let Some(target) = self.resolve_target(doc, surface) else {
            debug!("no eligible surface found, engaging clipboard fallback");
            return self.clipboard_fallback(doc, replacement, RefineError::NoSurfaceFound);
        };

        match self.apply(doc, &target, surface, original, replacement).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(%reason, "surface rejected programmatic edit, falling back to clipboard");
                self.clipboard_fallback(doc, replacement, reason)
            }
        }
    }

    /// Resolve the captured surface, or re-search the document for the best
    /// candidate: host-preferred surfaces first, then the eligibility
    /// ladder, then the aggressive pass over every text-bearing element.
    fn resolve_target(
        &self,
        doc: &dyn HostDocument,
        surface: Option<&SurfaceRef>,
    ) -> Option<SurfaceRef> {
        if let Some(surface) = surface
            && let Some(descriptor) = doc.descriptor(surface.element())
            && Self::still_editable(&descriptor)
        {
            return Some(surface.clone());
        }

        let url = doc.url();
        let candidates = find_candidates(doc);
        let preferred = candidates
            .iter()
            .find(|c| self.hints.prefers(&url, &c.descriptor))
            .or_else(|| candidates.first());
        if let Some(candidate) = preferred {
            debug!(matcher = %candidate.matcher, element = %candidate.descriptor.id,
                "re-resolved surface via eligibility ladder");
            return Some(Self::as_surface_ref(&candidate.descriptor));
        }

        aggressive_candidates(doc).first().map(|descriptor| {
            debug!(element = %descriptor.id, "re-resolved surface via aggressive pass");
            Self::as_surface_ref(descriptor)
        })
    }

    /// An element can still take an edit if it is attached, rendered and
    /// enabled. Read-only is tolerated: it gets lifted temporarily below.
    fn still_editable(descriptor: &ElementDescriptor) -> bool {
        !descriptor.hidden && !descriptor.disabled && !descriptor.rect.is_degenerate()
    }

    fn as_surface_ref(descriptor: &ElementDescriptor) -> SurfaceRef {
        if matches!(descriptor.tag.as_str(), "textarea" | "input") {
            SurfaceRef::PlainText {
                element: descriptor.id,
                selection_start: 0,
                selection_end: 0,
            }
        } else {
            SurfaceRef::RichText {
                element: descriptor.id,
            }
        }
    }

    async fn apply(
        &self,
        doc: &dyn HostDocument,
        target: &SurfaceRef,
        captured: Option<&SurfaceRef>,
        original: &str,
        replacement: &str,
    ) -> Result<ReplacementOutcome, RefineError> {
        let element = target.element();

        // Re-activate defensively: some hosts only accept programmatic edits
        // after a pointer/focus cycle.
        doc.dispatch(element, SyntheticEvent::PointerDown)?;
        doc.dispatch(element, SyntheticEvent::PointerUp)?;
        doc.focus(element)?;
        doc.dispatch(element, SyntheticEvent::Focus)?;

        let was_read_only = doc
            .descriptor(element)
            .map(|d| d.read_only)
            .unwrap_or(false);
        if was_read_only {
            doc.set_read_only(element, false)?;
        }

        // Captured offsets are only meaningful on the element they were
        // captured from.
        let offsets = captured
            .filter(|c| c.element() == element)
            .and_then(|c| c.plain_offsets());

        let content = doc.content(element).unwrap_or_default();
        let (next, cursor, substitution) =
            plan_substitution(&content, original, offsets, replacement);
        if let Substitution::FirstOccurrence { occurrences } = &substitution
            && *occurrences > 1
        {
            debug!(occurrences, "original text recurs; replacing first occurrence");
        }

        doc.set_content_native(element, &next)?;
        doc.set_cursor(element, cursor)?;
        for event in CHANGE_NOTIFICATION_SEQUENCE {
            doc.dispatch(element, *event)?;
        }

        // Let the host's own reactive updates settle, then verify once.
        tokio::time::sleep(self.config.settle_delay).await;
        if doc.content(element).as_deref() != Some(next.as_str()) {
            debug!(element = %element, "surface content diverged after write, reapplying once");
            doc.set_content_native(element, &next)?;
            doc.set_cursor(element, cursor)?;
            doc.dispatch(element, SyntheticEvent::Input)?;
        }

        if was_read_only {
            doc.set_read_only(element, true)?;
        }

        Ok(ReplacementOutcome::Applied {
            surface: target.clone(),
            cursor,
            substitution,
        })
    }

    fn clipboard_fallback(
        &self,
        doc: &dyn HostDocument,
        replacement: &str,
        reason: RefineError,
    ) -> ReplacementOutcome {
        match doc.clipboard_write(replacement) {
            Ok(()) => ReplacementOutcome::CopiedToClipboard,
            Err(err) => {
                warn!(%err, "clipboard fallback failed");
                ReplacementOutcome::Failed { reason }
            }
        }
    }
}
