//! Shared in-crate test double for the host document.

use crate::document::{HostDocument, SyntheticEvent};
use crate::error::{RefineError, Result};
use crate::geometry::{Rect, Viewport};
use crate::surface::{ElementDescriptor, ElementId};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    url: String,
    viewport: Option<Viewport>,
    elements: BTreeMap<ElementId, ElementDescriptor>,
    contents: BTreeMap<ElementId, String>,
    events: Vec<(ElementId, SyntheticEvent)>,
    focused: Option<ElementId>,
    cursors: BTreeMap<ElementId, usize>,
    clipboard: Option<String>,
    /// Swallow this many content writes before accepting one, to exercise
    /// the verify-and-reapply path.
    swallow_writes: usize,
    fail_mutations: bool,
}

/// A scripted host document for unit tests.
pub struct StubDocument {
    inner: Mutex<Inner>,
}

impl StubDocument {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                url: "https://example.com/page".to_string(),
                viewport: Some(Viewport::new(1280.0, 800.0)),
                ..Inner::default()
            }),
        }
    }

    pub fn with_url(self, url: &str) -> Self {
        self.inner.lock().unwrap().url = url.to_string();
        self
    }

    /// Register an element with initial content, returning its id.
    pub fn add_element(&self, descriptor: ElementDescriptor, content: &str) -> ElementId {
        let id = descriptor.id;
        let mut inner = self.inner.lock().unwrap();
        inner.elements.insert(id, descriptor);
        inner.contents.insert(id, content.to_string());
        id
    }

    /// Convenience: a visible textarea with the given id and content.
    pub fn add_textarea(&self, id: u64, content: &str) -> ElementId {
        self.add_element(
            ElementDescriptor::new(ElementId(id), "textarea", Rect::new(10.0, 10.0, 400.0, 120.0)),
            content,
        )
    }

    pub fn remove_element(&self, id: ElementId) {
        let mut inner = self.inner.lock().unwrap();
        inner.elements.remove(&id);
        inner.contents.remove(&id);
    }

    pub fn swallow_next_writes(&self, count: usize) {
        self.inner.lock().unwrap().swallow_writes = count;
    }

    pub fn fail_mutations(&self) {
        self.inner.lock().unwrap().fail_mutations = true;
    }

    pub fn events(&self) -> Vec<(ElementId, SyntheticEvent)> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.inner.lock().unwrap().clipboard.clone()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.inner.lock().unwrap().focused
    }

    pub fn cursor(&self, id: ElementId) -> Option<usize> {
        self.inner.lock().unwrap().cursors.get(&id).copied()
    }
}

impl Default for StubDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument for StubDocument {
    fn url(&self) -> String {
        self.inner.lock().unwrap().url.clone()
    }

    fn viewport(&self) -> Viewport {
        self.inner.lock().unwrap().viewport.unwrap()
    }

    fn descriptors(&self) -> Vec<ElementDescriptor> {
        self.inner.lock().unwrap().elements.values().cloned().collect()
    }

    fn descriptor(&self, id: ElementId) -> Option<ElementDescriptor> {
        self.inner.lock().unwrap().elements.get(&id).cloned()
    }

    fn content(&self, id: ElementId) -> Option<String> {
        self.inner.lock().unwrap().contents.get(&id).cloned()
    }

    fn set_content_native(&self, id: ElementId, text: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_mutations {
            return Err(RefineError::internal("scripted mutation failure"));
        }
        if !inner.elements.contains_key(&id) {
            return Err(RefineError::internal(format!("element {id} detached")));
        }
        if inner.swallow_writes > 0 {
            inner.swallow_writes -= 1;
            return Ok(());
        }
        inner.contents.insert(id, text.to_string());
        Ok(())
    }

    fn dispatch(&self, id: ElementId, event: SyntheticEvent) -> Result<()> {
        self.inner.lock().unwrap().events.push((id, event));
        Ok(())
    }

    fn focus(&self, id: ElementId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_mutations {
            return Err(RefineError::internal("scripted focus failure"));
        }
        inner.focused = Some(id);
        Ok(())
    }

    fn set_cursor(&self, id: ElementId, position: usize) -> Result<()> {
        self.inner.lock().unwrap().cursors.insert(id, position);
        Ok(())
    }

    fn set_read_only(&self, id: ElementId, read_only: bool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(descriptor) = inner.elements.get_mut(&id) {
            descriptor.read_only = read_only;
        }
        Ok(())
    }

    fn clipboard_write(&self, text: &str) -> Result<()> {
        self.inner.lock().unwrap().clipboard = Some(text.to_string());
        Ok(())
    }
}
