//! Text selections and their classification.

mod validator;

pub use validator::{Classification, IneligibleReason, classify};

use crate::geometry::Rect;
use crate::surface::{ElementId, SurfaceRef};
use serde::{Deserialize, Serialize};

/// A raw selection event as reported by the host adapter, before any
/// validation. Superseded by the next selection event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSelection {
    /// The selected text, verbatim.
    pub text: String,
    /// The selection's common ancestor element, when one could be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_element: Option<ElementId>,
    /// Bounding rect of the selected range, viewport-relative.
    pub anchor_rect: Rect,
    /// `selectionStart`/`selectionEnd` character offsets when the selection
    /// sits inside a plain text control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<(usize, usize)>,
}

impl RawSelection {
    pub fn new(text: impl Into<String>, anchor_rect: Rect) -> Self {
        Self {
            text: text.into(),
            anchor_element: None,
            anchor_rect,
            offsets: None,
        }
    }

    pub fn with_anchor(mut self, element: ElementId) -> Self {
        self.anchor_element = Some(element);
        self
    }

    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.offsets = Some((start, end));
        self
    }
}

/// An eligible selection, as produced by the validator.
///
/// Ephemeral: invalidated by the next selection event or by document
/// mutation; the owning surface is re-resolved, never reused, on each new
/// selection-to-replacement cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// The trimmed selected text.
    pub text: String,
    /// Bounding rect of the selected range, viewport-relative.
    pub anchor_rect: Rect,
    /// The editable surface owning the selection.
    pub owner: SurfaceRef,
}
