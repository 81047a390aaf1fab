//! Prioritized eligibility matchers over element descriptors.
//!
//! Host pages are uncontrolled, so surface detection is duck typing: a
//! ladder of polymorphic matchers, each a pure predicate over an
//! [`ElementDescriptor`], tried in a fixed priority order. Keeping the
//! heuristics data-driven makes them testable without a live document.

use crate::document::HostDocument;
use crate::geometry::Viewport;
use crate::surface::{ElementDescriptor, ElementId};
use strum::IntoEnumIterator;

/// Attribute/class/id keywords that mark an element as a likely text entry
/// target on chat- and search-centric pages.
pub const SURFACE_KEYWORDS: &[&str] = &[
    "search", "message", "prompt", "chat", "ask", "question", "comment", "compose", "input",
];

/// `input` types that hold free text.
const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "email", "url"];

/// The eligibility ladder, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum MatcherKind {
    /// Exact tag match for standard text-entry elements.
    TextEntryTag,
    /// The contenteditable flag.
    RichTextFlag,
    /// Accessibility role textbox/searchbox/combobox.
    AccessibilityRole,
    /// Keyword match over attributes, class and id.
    KeywordHeuristic,
}

impl MatcherKind {
    /// Pure predicate: does this matcher accept the descriptor?
    ///
    /// Visibility/enablement gating is applied separately by the caller so
    /// that the aggressive fallback pass can relax it.
    pub fn accepts(&self, descriptor: &ElementDescriptor) -> bool {
        match self {
            MatcherKind::TextEntryTag => match descriptor.tag.as_str() {
                "textarea" => true,
                "input" => descriptor
                    .input_type
                    .as_deref()
                    .map(|t| TEXT_INPUT_TYPES.contains(&t.to_lowercase().as_str()))
                    .unwrap_or(true),
                _ => false,
            },
            MatcherKind::RichTextFlag => descriptor.content_editable,
            MatcherKind::AccessibilityRole => descriptor
                .role
                .as_deref()
                .map(|r| {
                    matches!(r.to_lowercase().as_str(), "textbox" | "searchbox" | "combobox")
                })
                .unwrap_or(false),
            MatcherKind::KeywordHeuristic => {
                let haystack = descriptor.attribute_haystack();
                SURFACE_KEYWORDS.iter().any(|k| haystack.contains(k))
            }
        }
    }

    fn priority(&self) -> u8 {
        match self {
            MatcherKind::TextEntryTag => 0,
            MatcherKind::RichTextFlag => 1,
            MatcherKind::AccessibilityRole => 2,
            MatcherKind::KeywordHeuristic => 3,
        }
    }
}

/// Run the full ladder against one descriptor, gated by the usability check.
///
/// Returns the first (highest-priority) matcher that accepts, or `None` when
/// the element is no surface at all.
pub fn classify_surface(
    descriptor: &ElementDescriptor,
    viewport: &Viewport,
) -> Option<MatcherKind> {
    if !descriptor.is_usable(viewport) {
        return None;
    }
    MatcherKind::iter().find(|m| m.accepts(descriptor))
}

/// A surface candidate found during a document-wide search.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub descriptor: ElementDescriptor,
    pub matcher: MatcherKind,
}

/// Search the whole document for eligible surfaces, best first.
///
/// Ordering: matcher priority, then plausible-size elements before marginal
/// ones, then document order for determinism.
pub fn find_candidates(doc: &dyn HostDocument) -> Vec<RankedCandidate> {
    let viewport = doc.viewport();
    let mut candidates: Vec<RankedCandidate> = doc
        .descriptors()
        .into_iter()
        .filter_map(|d| {
            classify_surface(&d, &viewport).map(|matcher| RankedCandidate {
                descriptor: d,
                matcher,
            })
        })
        .collect();

    candidates.sort_by_key(|c| {
        (
            c.matcher.priority(),
            !c.descriptor.is_plausible_target(&viewport),
            c.descriptor.id,
        )
    });
    candidates
}

/// The aggressive fallback pass: every interactive text-bearing element,
/// ranked by keyword plausibility and then by generic visibility.
///
/// Relaxes the usability gate to tolerate read-only surfaces (the
/// replacement engine can temporarily unlock those) but still skips hidden,
/// disabled and zero-size elements.
pub fn aggressive_candidates(doc: &dyn HostDocument) -> Vec<ElementDescriptor> {
    let viewport = doc.viewport();
    let near = viewport
        .client_rect()
        .expanded(viewport.width, viewport.height);

    let mut candidates: Vec<ElementDescriptor> = doc
        .descriptors()
        .into_iter()
        .filter(|d| {
            !d.hidden
                && !d.disabled
                && !d.rect.is_degenerate()
                && d.rect.intersects(&near)
                && MatcherKind::iter().any(|m| m.accepts(d))
        })
        .collect();

    candidates.sort_by_key(|d| {
        let keyword_hit = MatcherKind::KeywordHeuristic.accepts(d);
        (
            !keyword_hit,
            !d.is_plausible_target(&viewport),
            d.id,
        )
    });
    candidates
}

/// Per-host surface preferences, consulted before the generic ladder when
/// re-searching for a replacement target.
///
/// Mirrors the site-specific selector lists real chat frontends need: the
/// composer on such pages is often a bare contenteditable div that only a
/// host-specific keyword identifies reliably.
#[derive(Debug, Clone)]
pub struct HostHints {
    hints: Vec<(String, Vec<String>)>,
}

impl HostHints {
    /// Hints for well-known chat and search frontends.
    pub fn defaults() -> Self {
        let hint = |host: &str, words: &[&str]| {
            (
                host.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            )
        };
        Self {
            hints: vec![
                hint("claude.ai", &["chat", "prosemirror"]),
                hint("chatgpt.com", &["composer", "prompt", "message"]),
                hint("chat.openai.com", &["composer", "prompt", "message"]),
                hint("gemini.google.com", &["prompt"]),
                hint("perplexity.ai", &["ask"]),
            ],
        }
    }

    /// An empty hint set (generic ladder only).
    pub fn none() -> Self {
        Self { hints: Vec::new() }
    }

    /// Keywords preferred for the given page URL, if its host is known.
    pub fn keywords_for(&self, url: &str) -> Option<&[String]> {
        self.hints
            .iter()
            .find(|(host, _)| url.contains(host.as_str()))
            .map(|(_, words)| words.as_slice())
    }

    /// Whether the descriptor matches a host-preferred keyword for this URL.
    pub fn prefers(&self, url: &str, descriptor: &ElementDescriptor) -> bool {
        let Some(keywords) = self.keywords_for(url) else {
            return false;
        };
        let haystack = descriptor.attribute_haystack();
        keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}

/// Walk a selection's ancestor chain until a classified surface is found.
pub fn owning_surface(
    doc: &dyn HostDocument,
    start: ElementId,
) -> Option<(ElementDescriptor, MatcherKind)> {
    let viewport = doc.viewport();
    let mut cursor = Some(start);
    // Bounded walk; host pages can contain cyclic parent data when adapters
    // misbehave.
    for _ in 0..64 {
        let id = cursor?;
        let descriptor = doc.descriptor(id)?;
        if let Some(matcher) = classify_surface(&descriptor, &viewport) {
            return Some((descriptor, matcher));
        }
        cursor = descriptor.parent;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use std::collections::BTreeMap;

    fn viewport() -> Viewport {
        Viewport::new(1280.0, 800.0)
    }

    fn base(tag: &str) -> ElementDescriptor {
        ElementDescriptor::new(ElementId(1), tag, Rect::new(10.0, 10.0, 400.0, 60.0))
    }

    #[test]
    fn textarea_matches_text_entry_tag() {
        assert_eq!(
            classify_surface(&base("textarea"), &viewport()),
            Some(MatcherKind::TextEntryTag)
        );
    }

    #[test]
    fn input_type_gates_tag_matcher() {
        let mut d = base("input");
        d.input_type = Some("text".into());
        assert!(MatcherKind::TextEntryTag.accepts(&d));

        d.input_type = Some("checkbox".into());
        assert!(!MatcherKind::TextEntryTag.accepts(&d));

        // No type attribute defaults to a text input.
        d.input_type = None;
        assert!(MatcherKind::TextEntryTag.accepts(&d));
    }

    #[test]
    fn contenteditable_div_matches_rich_text() {
        let mut d = base("div");
        d.content_editable = true;
        assert_eq!(
            classify_surface(&d, &viewport()),
            Some(MatcherKind::RichTextFlag)
        );
    }

    #[test]
    fn aria_roles_match() {
        for role in ["textbox", "searchbox", "combobox"] {
            let mut d = base("div");
            d.role = Some(role.into());
            assert_eq!(
                classify_surface(&d, &viewport()),
                Some(MatcherKind::AccessibilityRole),
                "role {role}"
            );
        }
        let mut d = base("div");
        d.role = Some("button".into());
        assert_eq!(classify_surface(&d, &viewport()), None);
    }

    #[test]
    fn keyword_heuristic_reads_attributes() {
        let mut d = base("div");
        d.attributes
            .insert("placeholder".into(), "Ask anything".into());
        assert_eq!(
            classify_surface(&d, &viewport()),
            Some(MatcherKind::KeywordHeuristic)
        );
    }

    #[test]
    fn plain_div_is_not_a_surface() {
        assert_eq!(classify_surface(&base("div"), &viewport()), None);
    }

    #[test]
    fn gating_excludes_disabled_elements() {
        let mut d = base("textarea");
        d.disabled = true;
        assert_eq!(classify_surface(&d, &viewport()), None);
    }

    #[test]
    fn ladder_priority_tag_beats_keyword() {
        let mut d = base("textarea");
        d.attributes.insert("class".into(), "chat-box".into());
        assert_eq!(
            classify_surface(&d, &viewport()),
            Some(MatcherKind::TextEntryTag)
        );
    }

    #[test]
    fn host_hints_match_known_frontends() {
        let hints = HostHints::defaults();
        let mut d = base("div");
        d.content_editable = true;
        d.attributes = BTreeMap::from([("class".to_string(), "ProseMirror".to_string())]);

        assert!(hints.prefers("https://claude.ai/chat/abc", &d));
        assert!(!hints.prefers("https://example.com/page", &d));
    }
}
