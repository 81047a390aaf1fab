//! Selection eligibility classification.
//!
//! Pure: re-run on every (debounced) selection event, never mutates the
//! document. Ineligible selections silently suppress the overlay; they are
//! classification results, not errors.

use crate::config::EngineConfig;
use crate::document::HostDocument;
use crate::selection::{RawSelection, Selection};
use crate::surface::{MatcherKind, SurfaceRef, owning_surface};

/// Why a selection was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum IneligibleReason {
    /// Trimmed length zero.
    EmptySelection,
    /// At or above the configured maximum length.
    TooLong,
    /// The selection's ancestry contains no eligible editable surface.
    NotEditableSurface,
    /// The owning surface has no content at all.
    SurfaceEmpty,
    /// The surface content is nothing but the (short) selection itself;
    /// typically residue of a deletion gesture, not an edit intent.
    SurfaceIsJustSelection,
}

/// Result of classifying one raw selection event.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Eligible(Selection),
    Ineligible(IneligibleReason),
}

impl Classification {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Classification::Eligible(_))
    }
}

/// Classify a raw selection against the current document state.
///
/// Surface resolution walks the selection's ancestor chain through the
/// matcher ladder; visibility and enablement are re-checked here even if the
/// same element was eligible moments ago, since host page state may have
/// changed since capture.
pub fn classify(
    raw: &RawSelection,
    doc: &dyn HostDocument,
    config: &EngineConfig,
) -> Classification {
    let trimmed = raw.text.trim();
    if trimmed.is_empty() {
        return Classification::Ineligible(IneligibleReason::EmptySelection);
    }
    let trimmed_chars = trimmed.chars().count();
    if trimmed_chars >= config.max_selection_chars {
        return Classification::Ineligible(IneligibleReason::TooLong);
    }

    let Some(anchor) = raw.anchor_element else {
        return Classification::Ineligible(IneligibleReason::NotEditableSurface);
    };
    let Some((descriptor, matcher)) = owning_surface(doc, anchor) else {
        return Classification::Ineligible(IneligibleReason::NotEditableSurface);
    };

    let content = doc.content(descriptor.id).unwrap_or_default();
    if content.trim().is_empty() {
        return Classification::Ineligible(IneligibleReason::SurfaceEmpty);
    }
    if content.trim() == trimmed && trimmed_chars < config.min_meaningful_selection {
        return Classification::Ineligible(IneligibleReason::SurfaceIsJustSelection);
    }

    let owner = match (matcher, raw.offsets) {
        (MatcherKind::TextEntryTag, Some((start, end))) => SurfaceRef::PlainText {
            element: descriptor.id,
            selection_start: start,
            selection_end: end,
        },
        (MatcherKind::TextEntryTag, None) => SurfaceRef::PlainText {
            element: descriptor.id,
            selection_start: 0,
            selection_end: 0,
        },
        _ => SurfaceRef::RichText {
            element: descriptor.id,
        },
    };

    Classification::Eligible(Selection {
        text: trimmed.to_string(),
        anchor_rect: raw.anchor_rect,
        owner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::surface::{ElementDescriptor, ElementId};
    use crate::testing::StubDocument;

    fn anchor_rect() -> Rect {
        Rect::new(40.0, 60.0, 180.0, 18.0)
    }

    fn reason(classification: Classification) -> IneligibleReason {
        match classification {
            Classification::Ineligible(reason) => reason,
            other => panic!("expected ineligible, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_only_selection_is_empty() {
        let doc = StubDocument::new();
        let raw = RawSelection::new("  \n\t ", anchor_rect());
        assert_eq!(
            reason(classify(&raw, &doc, &EngineConfig::default())),
            IneligibleReason::EmptySelection
        );
    }

    #[test]
    fn selection_at_limit_is_too_long() {
        let doc = StubDocument::new();
        let config = EngineConfig::default();
        let id = doc.add_textarea(1, "padding so the surface is not empty");
        let raw = RawSelection::new("x".repeat(config.max_selection_chars), anchor_rect())
            .with_anchor(id);
        assert_eq!(reason(classify(&raw, &doc, &config)), IneligibleReason::TooLong);
    }

    #[test]
    fn selection_just_under_limit_is_eligible() {
        let doc = StubDocument::new();
        let config = EngineConfig::default();
        let text = "x".repeat(config.max_selection_chars - 1);
        let id = doc.add_textarea(1, &text);
        let raw = RawSelection::new(text, anchor_rect()).with_anchor(id);
        assert!(classify(&raw, &doc, &config).is_eligible());
    }

    #[test]
    fn selection_without_anchor_has_no_surface() {
        let doc = StubDocument::new();
        let raw = RawSelection::new("rewrite this", anchor_rect());
        assert_eq!(
            reason(classify(&raw, &doc, &EngineConfig::default())),
            IneligibleReason::NotEditableSurface
        );
    }

    #[test]
    fn selection_in_plain_div_has_no_surface() {
        let doc = StubDocument::new();
        let id = doc.add_element(
            ElementDescriptor::new(ElementId(7), "div", Rect::new(0.0, 0.0, 600.0, 400.0)),
            "static prose",
        );
        let raw = RawSelection::new("static prose", anchor_rect()).with_anchor(id);
        assert_eq!(
            reason(classify(&raw, &doc, &EngineConfig::default())),
            IneligibleReason::NotEditableSurface
        );
    }

    #[test]
    fn empty_surface_is_rejected() {
        let doc = StubDocument::new();
        let id = doc.add_textarea(1, "   ");
        let raw = RawSelection::new("stale text", anchor_rect()).with_anchor(id);
        assert_eq!(
            reason(classify(&raw, &doc, &EngineConfig::default())),
            IneligibleReason::SurfaceEmpty
        );
    }

    #[test]
    fn short_selection_equal_to_content_is_deletion_residue() {
        let doc = StubDocument::new();
        let id = doc.add_textarea(1, "hi there");
        let raw = RawSelection::new("hi there", anchor_rect()).with_anchor(id);
        assert_eq!(
            reason(classify(&raw, &doc, &EngineConfig::default())),
            IneligibleReason::SurfaceIsJustSelection
        );
    }

    #[test]
    fn long_selection_equal_to_content_is_still_eligible() {
        // Selecting the whole draft to rewrite it is a real intent once the
        // text is long enough to be meaningful.
        let doc = StubDocument::new();
        let text = "please rewrite this whole paragraph for me";
        let id = doc.add_textarea(1, text);
        let raw = RawSelection::new(text, anchor_rect()).with_anchor(id);
        assert!(classify(&raw, &doc, &EngineConfig::default()).is_eligible());
    }

    #[test]
    fn textarea_selection_yields_plain_text_owner_with_offsets() {
        let doc = StubDocument::new();
        let id = doc.add_textarea(1, "draft: fix the middle part please");
        let raw = RawSelection::new("the middle part", anchor_rect())
            .with_anchor(id)
            .with_offsets(11, 26);
        match classify(&raw, &doc, &EngineConfig::default()) {
            Classification::Eligible(selection) => {
                assert_eq!(
                    selection.owner,
                    SurfaceRef::PlainText {
                        element: id,
                        selection_start: 11,
                        selection_end: 26,
                    }
                );
                assert_eq!(selection.text, "the middle part");
            }
            other => panic!("expected eligible, got {other:?}"),
        }
    }

    #[test]
    fn contenteditable_selection_yields_rich_text_owner() {
        let doc = StubDocument::new();
        let mut editor =
            ElementDescriptor::new(ElementId(3), "div", Rect::new(0.0, 0.0, 700.0, 300.0));
        editor.content_editable = true;
        let id = doc.add_element(editor, "a longer rich text draft body");
        let raw = RawSelection::new("rich text draft", anchor_rect()).with_anchor(id);
        match classify(&raw, &doc, &EngineConfig::default()) {
            Classification::Eligible(selection) => {
                assert_eq!(selection.owner, SurfaceRef::RichText { element: id });
            }
            other => panic!("expected eligible, got {other:?}"),
        }
    }

    #[test]
    fn anchor_inside_editor_resolves_through_ancestors() {
        let doc = StubDocument::new();
        let mut editor =
            ElementDescriptor::new(ElementId(3), "div", Rect::new(0.0, 0.0, 700.0, 300.0));
        editor.content_editable = true;
        let editor_id = doc.add_element(editor, "a longer rich text draft body");

        let mut span =
            ElementDescriptor::new(ElementId(4), "span", Rect::new(10.0, 10.0, 200.0, 20.0));
        span.parent = Some(editor_id);
        let span_id = doc.add_element(span, "rich text draft");

        let raw = RawSelection::new("rich text draft", anchor_rect()).with_anchor(span_id);
        match classify(&raw, &doc, &EngineConfig::default()) {
            Classification::Eligible(selection) => {
                assert_eq!(selection.owner, SurfaceRef::RichText { element: editor_id });
            }
            other => panic!("expected eligible, got {other:?}"),
        }
    }

    #[test]
    fn leading_and_trailing_whitespace_is_trimmed() {
        let doc = StubDocument::new();
        let id = doc.add_textarea(1, "some surrounding draft text here");
        let raw = RawSelection::new("  surrounding draft  ", anchor_rect()).with_anchor(id);
        match classify(&raw, &doc, &EngineConfig::default()) {
            Classification::Eligible(selection) => {
                assert_eq!(selection.text, "surrounding draft");
            }
            other => panic!("expected eligible, got {other:?}"),
        }
    }
}
