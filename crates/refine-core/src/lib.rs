//! Core domain of the refine engine.
//!
//! The engine takes a text selection on an uncontrolled host page, sends it
//! to a remote transformation service, and substitutes the result back into
//! the owning editable surface. This crate holds everything that is pure
//! domain logic: selection classification, surface eligibility heuristics,
//! transform sessions and their cache, overlay geometry, the overlay
//! lifecycle state machine and the replacement algorithm. I/O lives behind
//! the trait seams ([`document::HostDocument`], [`transform::TransformService`],
//! [`session::SessionRepository`], [`config::SecretService`]) implemented by
//! the infrastructure and interaction crates.

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod replace;
pub mod selection;
pub mod session;
pub mod surface;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the shared error type.
pub use error::{RefineError, Result};
