//! Editable surfaces of the host document.
//!
//! A surface is a region capable of holding user-entered text: a plain text
//! control (`textarea`, `input`) or a rich/contenteditable node. Surfaces are
//! identified by matching element descriptors against a prioritized ladder of
//! eligibility matchers; a matched surface is referenced by a [`SurfaceRef`]
//! that lives for exactly one selection-to-replacement cycle.

mod descriptor;
mod matcher;

pub use descriptor::{ElementDescriptor, ElementId};
pub use matcher::{
    HostHints, MatcherKind, RankedCandidate, aggressive_candidates, classify_surface,
    find_candidates, owning_surface,
};

use serde::{Deserialize, Serialize};

/// Reference to the single editable element that owns a selection.
///
/// Host pages detach and reattach nodes freely, so a `SurfaceRef` is
/// re-resolved on each new cycle rather than reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceRef {
    /// A `textarea`/`input` style control with character offsets captured at
    /// selection time.
    PlainText {
        element: ElementId,
        selection_start: usize,
        selection_end: usize,
    },
    /// A contenteditable (rich text) region.
    RichText { element: ElementId },
}

impl SurfaceRef {
    /// The element this reference points at.
    pub fn element(&self) -> ElementId {
        match self {
            SurfaceRef::PlainText { element, .. } | SurfaceRef::RichText { element } => *element,
        }
    }

    /// The captured plain-text selection offsets, if this is a plain control.
    pub fn plain_offsets(&self) -> Option<(usize, usize)> {
        match self {
            SurfaceRef::PlainText {
                selection_start,
                selection_end,
                ..
            } => Some((*selection_start, *selection_end)),
            SurfaceRef::RichText { .. } => None,
        }
    }
}
