//! Abstract element descriptors.
//!
//! The engine never touches a live DOM node directly; the host adapter
//! projects each element into an `ElementDescriptor` (tag, role, attributes,
//! geometry, state flags) and all eligibility heuristics are pure predicates
//! over that projection.

use crate::geometry::{Rect, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle to one element of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of one host element, as seen at classification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub id: ElementId,
    /// Parent element, for walking a selection's ancestor chain.
    pub parent: Option<ElementId>,
    /// Lowercase tag name (`textarea`, `div`, ...).
    pub tag: String,
    /// The `type` attribute for `input` elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Whether the element is flagged contenteditable.
    #[serde(default)]
    pub content_editable: bool,
    /// Accessibility role, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Relevant attributes: placeholder, aria-label, class, id, name,
    /// data-testid. Values are kept verbatim; matching lowercases them.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Rendered bounding rect, viewport-relative.
    pub rect: Rect,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    /// display:none / visibility:hidden.
    #[serde(default)]
    pub hidden: bool,
}

impl ElementDescriptor {
    /// Minimal constructor for a visible, enabled element.
    pub fn new(id: ElementId, tag: impl Into<String>, rect: Rect) -> Self {
        Self {
            id,
            parent: None,
            tag: tag.into(),
            input_type: None,
            content_editable: false,
            role: None,
            attributes: BTreeMap::new(),
            rect,
            disabled: false,
            read_only: false,
            hidden: false,
        }
    }

    /// A usable surface renders with non-zero size, is interactable, and sits
    /// within (or near) the visible viewport. "Near" means within one
    /// viewport width/height of the visible bounds, since selections can
    /// legitimately start just off-screen mid-scroll.
    pub fn is_usable(&self, viewport: &Viewport) -> bool {
        !self.hidden
            && !self.disabled
            && !self.read_only
            && !self.rect.is_degenerate()
            && self
                .rect
                .intersects(&viewport.client_rect().expanded(viewport.width, viewport.height))
    }

    /// Whether the element is big enough to plausibly be a real text entry
    /// target, as opposed to a decorative or measurement node.
    pub fn is_plausible_target(&self, viewport: &Viewport) -> bool {
        self.is_usable(viewport) && self.rect.width > 100.0 && self.rect.height > 20.0
    }

    /// Lowercased concatenation of every attribute value, for keyword
    /// heuristics.
    pub fn attribute_haystack(&self) -> String {
        let mut haystack = String::new();
        for value in self.attributes.values() {
            haystack.push_str(&value.to_lowercase());
            haystack.push(' ');
        }
        haystack
    }
}
