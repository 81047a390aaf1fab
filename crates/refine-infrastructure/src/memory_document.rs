//! In-memory host document.
//!
//! A complete [`HostDocument`] implementation holding its whole state behind
//! a mutex. Used by the integration suites and by headless embeddings that
//! drive the engine without a real page behind it.

use refine_core::document::{HostDocument, SyntheticEvent};
use refine_core::geometry::{Rect, Viewport};
use refine_core::surface::{ElementDescriptor, ElementId};
use refine_core::{RefineError, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

struct State {
    url: String,
    viewport: Viewport,
    elements: BTreeMap<ElementId, ElementDescriptor>,
    contents: BTreeMap<ElementId, String>,
    events: Vec<(ElementId, SyntheticEvent)>,
    focused: Option<ElementId>,
    cursors: BTreeMap<ElementId, usize>,
    clipboard: Option<String>,
}

/// A self-contained document whose elements and viewport are mutated through
/// plain methods instead of a live page.
pub struct MemoryDocument {
    state: Mutex<State>,
}

impl MemoryDocument {
    pub fn new(url: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            state: Mutex::new(State {
                url: url.into(),
                viewport,
                elements: BTreeMap::new(),
                contents: BTreeMap::new(),
                events: Vec::new(),
                focused: None,
                cursors: BTreeMap::new(),
                clipboard: None,
            }),
        }
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| RefineError::internal("document mutex poisoned"))
    }

    /// Insert or replace an element, keeping any existing content.
    pub fn upsert_element(&self, descriptor: ElementDescriptor) -> ElementId {
        let id = descriptor.id;
        if let Ok(mut state) = self.state() {
            state.elements.insert(id, descriptor);
            state.contents.entry(id).or_default();
        }
        id
    }

    /// Insert a visible textarea with the given id and content.
    pub fn insert_textarea(&self, id: u64, rect: Rect, content: &str) -> ElementId {
        let id = self.upsert_element(ElementDescriptor::new(ElementId(id), "textarea", rect));
        self.write_content(id, content);
        id
    }

    /// Overwrite an element's content directly, bypassing event dispatch.
    pub fn write_content(&self, id: ElementId, content: &str) {
        if let Ok(mut state) = self.state() {
            state.contents.insert(id, content.to_string());
        }
    }

    /// Detach an element, simulating host-page DOM churn.
    pub fn remove_element(&self, id: ElementId) {
        if let Ok(mut state) = self.state() {
            state.elements.remove(&id);
            state.contents.remove(&id);
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        if let Ok(mut state) = self.state() {
            state.viewport = viewport;
        }
    }

    pub fn events(&self) -> Vec<(ElementId, SyntheticEvent)> {
        self.state().map(|s| s.events.clone()).unwrap_or_default()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state().ok().and_then(|s| s.clipboard.clone())
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.state().ok().and_then(|s| s.focused)
    }

    pub fn cursor(&self, id: ElementId) -> Option<usize> {
        self.state().ok().and_then(|s| s.cursors.get(&id).copied())
    }
}

impl HostDocument for MemoryDocument {
    fn url(&self) -> String {
        self.state().map(|s| s.url.clone()).unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.state()
            .map(|s| s.viewport)
            .unwrap_or_else(|_| Viewport::new(0.0, 0.0))
    }

    fn descriptors(&self) -> Vec<ElementDescriptor> {
        self.state()
            .map(|s| s.elements.values().cloned().collect())
            .unwrap_or_default()
    }

    fn descriptor(&self, id: ElementId) -> Option<ElementDescriptor> {
        self.state().ok().and_then(|s| s.elements.get(&id).cloned())
    }

    fn content(&self, id: ElementId) -> Option<String> {
        self.state().ok().and_then(|s| s.contents.get(&id).cloned())
    }

    fn set_content_native(&self, id: ElementId, text: &str) -> Result<()> {
        let mut state = self.state()?;
        if !state.elements.contains_key(&id) {
            return Err(RefineError::internal(format!("element {id} detached")));
        }
        state.contents.insert(id, text.to_string());
        Ok(())
    }

    fn dispatch(&self, id: ElementId, event: SyntheticEvent) -> Result<()> {
        self.state()?.events.push((id, event));
        Ok(())
    }

    fn focus(&self, id: ElementId) -> Result<()> {
        let mut state = self.state()?;
        if !state.elements.contains_key(&id) {
            return Err(RefineError::internal(format!("element {id} detached")));
        }
        state.focused = Some(id);
        Ok(())
    }

    fn set_cursor(&self, id: ElementId, position: usize) -> Result<()> {
        self.state()?.cursors.insert(id, position);
        Ok(())
    }

    fn set_read_only(&self, id: ElementId, read_only: bool) -> Result<()> {
        let mut state = self.state()?;
        if let Some(descriptor) = state.elements.get_mut(&id) {
            descriptor.read_only = read_only;
        }
        Ok(())
    }

    fn clipboard_write(&self, text: &str) -> Result<()> {
        self.state()?.clipboard = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> MemoryDocument {
        MemoryDocument::new("https://example.com", Viewport::new(1280.0, 800.0))
    }

    #[test]
    fn native_write_replaces_content() {
        let doc = document();
        let id = doc.insert_textarea(1, Rect::new(10.0, 10.0, 400.0, 120.0), "before");
        doc.set_content_native(id, "after").unwrap();
        assert_eq!(doc.content(id).as_deref(), Some("after"));
    }

    #[test]
    fn writes_to_detached_elements_fail() {
        let doc = document();
        let id = doc.insert_textarea(1, Rect::new(10.0, 10.0, 400.0, 120.0), "text");
        doc.remove_element(id);
        assert!(doc.set_content_native(id, "after").is_err());
        assert!(doc.focus(id).is_err());
    }

    #[test]
    fn dispatched_events_are_recorded_in_order() {
        let doc = document();
        let id = doc.insert_textarea(1, Rect::new(10.0, 10.0, 400.0, 120.0), "text");
        doc.dispatch(id, SyntheticEvent::Focus).unwrap();
        doc.dispatch(id, SyntheticEvent::Input).unwrap();
        assert_eq!(
            doc.events(),
            vec![(id, SyntheticEvent::Focus), (id, SyntheticEvent::Input)]
        );
    }
}
