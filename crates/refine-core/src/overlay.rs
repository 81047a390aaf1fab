//! Overlay lifecycle state machine.
//!
//! `Idle → Shown → RequestPending → ResultShown → Closed(cooldown)`, with
//! the guard rails the uncontrolled host environment demands: re-entrant
//! triggers are ignored while a request is pending, close requests during a
//! pending request are refused (in-flight calls cannot be user-cancelled),
//! and a fixed cooldown after close absorbs the residual selection/focus
//! events the close action itself produces.

use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle states of one overlay instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    /// An eligible selection is captured and the overlay is visible.
    Shown,
    /// The transform request is in flight; `large_text` drives wait
    /// messaging in the frontend.
    RequestPending { large_text: bool },
    /// A transform result is displayed, awaiting accept or dismiss.
    ResultShown,
    /// Closed; new selections are ignored until `until`.
    Closed { until: Instant },
}

/// Outcome of reporting an eligible selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The overlay (re)entered `Shown`.
    Shown,
    /// Ignored: still within the post-close cooldown window.
    IgnoredCooldown,
    /// Ignored: a request is in flight.
    IgnoredBusy,
}

/// Outcome of a transform trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Transitioned to `RequestPending`.
    Started,
    /// A request is already pending; the trigger is a no-op.
    AlreadyPending,
    /// The overlay is not in a triggerable state.
    NotShowable,
}

/// Outcome of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Entered the cooldown window.
    Closed,
    /// Refused: a request is in flight. Surface a "please wait" affordance;
    /// the affordance resets on its own, the request is NOT queued.
    DeferredBusy,
}

/// The overlay lifecycle driver. One instance per document context; it owns
/// no I/O, only transitions.
#[derive(Debug)]
pub struct OverlayStateMachine {
    state: OverlayState,
    cooldown: Duration,
}

impl OverlayStateMachine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: OverlayState::Idle,
            cooldown,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, OverlayState::RequestPending { .. })
    }

    /// Whether the pending request was flagged as large text.
    pub fn pending_large_text(&self) -> bool {
        matches!(
            self.state,
            OverlayState::RequestPending { large_text: true }
        )
    }

    /// An eligible selection was captured.
    pub fn selection_captured(&mut self) -> SelectionOutcome {
        match self.state {
            OverlayState::RequestPending { .. } => SelectionOutcome::IgnoredBusy,
            OverlayState::Closed { until } if Instant::now() < until => {
                SelectionOutcome::IgnoredCooldown
            }
            _ => {
                self.state = OverlayState::Shown;
                SelectionOutcome::Shown
            }
        }
    }

    /// The user triggered a transform.
    pub fn trigger_requested(&mut self, large_text: bool) -> TriggerOutcome {
        match self.state {
            OverlayState::Shown => {
                self.state = OverlayState::RequestPending { large_text };
                TriggerOutcome::Started
            }
            OverlayState::RequestPending { .. } => TriggerOutcome::AlreadyPending,
            _ => TriggerOutcome::NotShowable,
        }
    }

    /// The in-flight request resolved successfully.
    pub fn request_succeeded(&mut self) {
        if self.is_pending() {
            self.state = OverlayState::ResultShown;
        }
    }

    /// The in-flight request failed; the error is surfaced separately and
    /// the overlay stays up so the user may retry.
    pub fn request_failed(&mut self) {
        if self.is_pending() {
            self.state = OverlayState::Shown;
        }
    }

    /// The user accepted the result or dismissed the overlay.
    pub fn close_requested(&mut self) -> CloseOutcome {
        if self.is_pending() {
            return CloseOutcome::DeferredBusy;
        }
        self.state = OverlayState::Closed {
            until: Instant::now() + self.cooldown,
        };
        CloseOutcome::Closed
    }
}
