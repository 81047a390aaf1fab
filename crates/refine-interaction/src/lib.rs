//! Remote-service layer: the Gemini client and the request controller.

pub mod config;
pub mod controller;
pub mod gemini;

pub use crate::config::{DEFAULT_MODEL, GenerationProfile};
pub use crate::controller::{RequestController, Submission};
pub use crate::gemini::GeminiClient;
