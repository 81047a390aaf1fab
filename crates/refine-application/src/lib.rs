//! Application layer: overlay orchestration and context activation.

pub mod activation;
pub mod overlay_usecase;

pub use crate::activation::{ActivationRegistry, InjectionPolicy};
pub use crate::overlay_usecase::{
    LayoutSignal, OverlayUseCase, SelectionResponse, TriggerResponse,
};
