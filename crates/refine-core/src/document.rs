//! The host document seam.
//!
//! Everything the engine needs from the surrounding page goes through
//! [`HostDocument`]: descriptor snapshots, native value mutation, focus and
//! cursor control, synthetic event dispatch, viewport geometry, and the
//! clipboard fallback. No particular reactive framework is assumed on the
//! other side; adapters for a real page implement this trait, and tests use
//! an in-memory implementation.

use crate::error::Result;
use crate::geometry::Viewport;
use crate::surface::{ElementDescriptor, ElementId};
use serde::{Deserialize, Serialize};

/// Standard change-notification events synthesized after a programmatic
/// edit so host-page listeners refire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyntheticEvent {
    PointerDown,
    PointerUp,
    Focus,
    Input,
    Change,
    KeyUp,
    Paste,
}

/// The notification sequence dispatched after a value write.
pub const CHANGE_NOTIFICATION_SEQUENCE: &[SyntheticEvent] = &[
    SyntheticEvent::Input,
    SyntheticEvent::Change,
    SyntheticEvent::KeyUp,
    SyntheticEvent::Paste,
];

/// Read/write access to the uncontrolled host document.
///
/// Implementations must route value writes through the platform's native
/// mutation path (not any framework-level synthetic wrapper) so reactive
/// frameworks observe the change.
pub trait HostDocument: Send + Sync {
    /// The page URL, used for persisted-session identity.
    fn url(&self) -> String;

    /// Current viewport geometry.
    fn viewport(&self) -> Viewport;

    /// Snapshot of every element the adapter exposes, in document order.
    fn descriptors(&self) -> Vec<ElementDescriptor>;

    /// Snapshot of a single element, or `None` if it has been detached.
    fn descriptor(&self, id: ElementId) -> Option<ElementDescriptor>;

    /// The full text content of an element (value for plain controls, text
    /// content for rich regions).
    fn content(&self, id: ElementId) -> Option<String>;

    /// Write `text` as the element's full content through the native path.
    fn set_content_native(&self, id: ElementId, text: &str) -> Result<()>;

    /// Dispatch a synthetic UI event on the element.
    fn dispatch(&self, id: ElementId, event: SyntheticEvent) -> Result<()>;

    /// Move keyboard focus to the element.
    fn focus(&self, id: ElementId) -> Result<()>;

    /// Place the caret at a character offset within the element.
    fn set_cursor(&self, id: ElementId, position: usize) -> Result<()>;

    /// Toggle the element's read-only flag.
    fn set_read_only(&self, id: ElementId, read_only: bool) -> Result<()>;

    /// Write text to the system clipboard.
    fn clipboard_write(&self, text: &str) -> Result<()>;
}
