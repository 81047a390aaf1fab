//! The overlay use case.
//!
//! Orchestrates one document context's selection → classify → request →
//! result → replace lifecycle over the seams the core declares: the host
//! document, the secret service, the session repository and the transform
//! service. All storage faults are logged and degraded, the primary flow
//! only ever stops on service failures the user can act on.

use refine_core::RefineError;
use refine_core::config::{EngineConfig, SecretService};
use refine_core::document::HostDocument;
use refine_core::geometry::{self, OverlayPosition, Reposition, Size};
use refine_core::overlay::{CloseOutcome, OverlayStateMachine, SelectionOutcome, TriggerOutcome};
use refine_core::replace::{ReplacementEngine, ReplacementOutcome};
use refine_core::selection::{Classification, IneligibleReason, RawSelection, Selection, classify};
use refine_core::session::{SessionCache, SessionRepository, TransformSession};
use refine_core::surface::HostHints;
use refine_core::transform::TransformService;
use refine_interaction::{RequestController, Submission};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// A layout disturbance that may invalidate the overlay placement.
///
/// The three sources are deliberately collapsed into one signal; the
/// reposition pass recomputes from current geometry regardless of which one
/// fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSignal {
    Scrolled,
    ViewportResized,
    ContentResized,
}

/// Response to one selection intake.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionResponse {
    /// The overlay should show at `placement`.
    Shown { placement: OverlayPosition },
    /// The selection is not eligible; the overlay stays hidden.
    Suppressed(IneligibleReason),
    /// Inside the post-close cooldown window.
    IgnoredCooldown,
    /// A request is in flight.
    IgnoredBusy,
    /// A newer selection event arrived during the debounce window.
    Superseded,
}

/// Response to a transform trigger.
#[derive(Debug)]
pub enum TriggerResponse {
    /// A transformed text is ready for display.
    Completed {
        transformed: String,
        from_cache: bool,
    },
    /// A request is already pending.
    AlreadyPending,
    /// No selection is showing; nothing to transform.
    NotShowable,
    /// The request failed; `message` is the user-facing phrasing.
    Failed {
        error: RefineError,
        message: String,
    },
}

/// Drives the full overlay lifecycle for one document context.
pub struct OverlayUseCase {
    config: EngineConfig,
    doc: Arc<dyn HostDocument>,
    secrets: Arc<dyn SecretService>,
    sessions: Arc<dyn SessionRepository>,
    controller: RequestController,
    engine: ReplacementEngine,
    machine: Mutex<OverlayStateMachine>,
    cache: Mutex<SessionCache>,
    selection: Mutex<Option<Selection>>,
    placement: Mutex<Option<OverlayPosition>>,
    intake_generation: AtomicU64,
}

impl OverlayUseCase {
    pub fn new(
        config: EngineConfig,
        doc: Arc<dyn HostDocument>,
        secrets: Arc<dyn SecretService>,
        sessions: Arc<dyn SessionRepository>,
        service: Arc<dyn TransformService>,
    ) -> Self {
        let machine = OverlayStateMachine::new(config.close_cooldown);
        let engine = ReplacementEngine::new(config.clone());
        Self {
            config,
            doc,
            secrets,
            sessions,
            controller: RequestController::new(service),
            engine,
            machine: Mutex::new(machine),
            cache: Mutex::new(SessionCache::new()),
            selection: Mutex::new(None),
            placement: Mutex::new(None),
            intake_generation: AtomicU64::new(0),
        }
    }

    /// Replace the per-host surface preferences used during replacement.
    pub fn with_hints(mut self, hints: HostHints) -> Self {
        self.engine = ReplacementEngine::new(self.config.clone()).with_hints(hints);
        self
    }

    /// Page-load housekeeping: collect expired sessions, then warm the cache
    /// from a persisted session for this page if one survives.
    ///
    /// Storage faults degrade to a cold start.
    pub async fn startup(&self) -> Option<TransformSession> {
        match self.sessions.garbage_collect().await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "collected expired sessions at startup"),
            Err(e) => warn!(error = %e, "session garbage collection failed"),
        }
        let restored = match self.sessions.restore(&self.doc.url()).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "session restore failed, starting cold");
                None
            }
        };
        if let Some(session) = &restored {
            self.cache.lock().unwrap().put(session.clone());
            debug!(session_key = %session.session_key, "restored persisted session");
        }
        restored
    }

    /// Debounced selection intake.
    ///
    /// Selection events arrive in bursts while the user drags; only the last
    /// event of a burst is classified. Callers race their intakes freely, a
    /// superseded call reports back without touching any state.
    pub async fn intake(&self, raw: RawSelection, overlay: Size) -> SelectionResponse {
        let generation = self.intake_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.config.selection_debounce).await;
        if self.intake_generation.load(Ordering::SeqCst) != generation {
            return SelectionResponse::Superseded;
        }
        self.handle_selection(&raw, overlay)
    }

    /// Classify a selection and, when eligible, show the overlay at its
    /// computed placement.
    pub fn handle_selection(&self, raw: &RawSelection, overlay: Size) -> SelectionResponse {
        let selection = match classify(raw, &*self.doc, &self.config) {
            Classification::Eligible(selection) => selection,
            Classification::Ineligible(reason) => {
                debug!(%reason, "selection suppressed");
                return SelectionResponse::Suppressed(reason);
            }
        };

        match self.machine.lock().unwrap().selection_captured() {
            SelectionOutcome::IgnoredCooldown => return SelectionResponse::IgnoredCooldown,
            SelectionOutcome::IgnoredBusy => return SelectionResponse::IgnoredBusy,
            SelectionOutcome::Shown => {}
        }

        let placement = geometry::place(overlay, selection.anchor_rect, &self.doc.viewport());
        *self.selection.lock().unwrap() = Some(selection);
        *self.placement.lock().unwrap() = Some(placement.clone());
        SelectionResponse::Shown { placement }
    }

    /// Run the transform for the current selection.
    ///
    /// A cache hit answers without any network use. Without a credential the
    /// request is refused before any network use and the overlay stays up so
    /// the user can configure a key and retry.
    pub async fn trigger(&self) -> TriggerResponse {
        let Some(text) = self
            .selection
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.text.clone())
        else {
            return TriggerResponse::NotShowable;
        };

        if let Some(session) = self.cache.lock().unwrap().get(&text) {
            let transformed = session.transformed_text.clone();
            let mut machine = self.machine.lock().unwrap();
            match machine.trigger_requested(false) {
                TriggerOutcome::Started => {
                    machine.request_succeeded();
                    debug!("answered trigger from session cache");
                    return TriggerResponse::Completed {
                        transformed,
                        from_cache: true,
                    };
                }
                TriggerOutcome::AlreadyPending => return TriggerResponse::AlreadyPending,
                TriggerOutcome::NotShowable => return TriggerResponse::NotShowable,
            }
        }

        // Credential presence is checked before the state machine moves, so
        // a misconfigured user is never shown a pending state.
        if let Err(error) = self.load_credentialed_secrets().await {
            return TriggerResponse::Failed {
                message: error.user_message(),
                error,
            };
        }

        let large_text = self.config.is_large_text(&text);
        match self.machine.lock().unwrap().trigger_requested(large_text) {
            TriggerOutcome::Started => {}
            TriggerOutcome::AlreadyPending => return TriggerResponse::AlreadyPending,
            TriggerOutcome::NotShowable => return TriggerResponse::NotShowable,
        }

        match self.controller.submit(&text).await {
            Submission::AlreadyInFlight => {
                // The machine said go but the controller disagreed; put the
                // overlay back in the showable state.
                self.machine.lock().unwrap().request_failed();
                TriggerResponse::AlreadyPending
            }
            Submission::Finished(Ok(transformed)) => {
                self.machine.lock().unwrap().request_succeeded();
                let session = TransformSession::new(&text, &transformed, self.doc.url());
                self.cache.lock().unwrap().put(session.clone());
                if let Err(e) = self.sessions.persist(&session).await {
                    warn!(error = %e, "failed to persist session, continuing in-memory");
                }
                TriggerResponse::Completed {
                    transformed,
                    from_cache: false,
                }
            }
            Submission::Finished(Err(error)) => {
                self.machine.lock().unwrap().request_failed();
                warn!(%error, "transform request failed");
                TriggerResponse::Failed {
                    message: error.user_message(),
                    error,
                }
            }
        }
    }

    /// Whether the pending request carries large text, for wait messaging.
    pub fn pending_large_text(&self) -> bool {
        self.machine.lock().unwrap().pending_large_text()
    }

    pub fn is_busy(&self) -> bool {
        self.machine.lock().unwrap().is_pending()
    }

    /// Accept the displayed result: substitute it into the document, then
    /// destroy the session and close.
    ///
    /// The overlay only closes when the text landed somewhere the user can
    /// get it (surface or clipboard); a total failure keeps it open.
    pub async fn accept(&self) -> refine_core::Result<ReplacementOutcome> {
        let (original, transformed) = {
            let cache = self.cache.lock().unwrap();
            let session = cache
                .current()
                .ok_or_else(|| RefineError::internal("no transform result to accept"))?;
            (session.original_text.clone(), session.transformed_text.clone())
        };
        let surface = self.selection.lock().unwrap().as_ref().map(|s| s.owner.clone());

        let outcome = self
            .engine
            .replace(&*self.doc, surface.as_ref(), &original, &transformed)
            .await;

        if !matches!(outcome, ReplacementOutcome::Failed { .. }) {
            self.cache.lock().unwrap().clear_current();
            if let Err(e) = self.sessions.clear_current().await {
                warn!(error = %e, "failed to clear persisted session");
            }
            self.close_state();
        }
        Ok(outcome)
    }

    /// Dismiss the overlay without replacing.
    ///
    /// The session survives in cache and storage so re-selecting the same
    /// text answers instantly. Refused while a request is pending.
    pub fn dismiss(&self) -> CloseOutcome {
        let outcome = self.machine.lock().unwrap().close_requested();
        if outcome == CloseOutcome::Closed {
            *self.selection.lock().unwrap() = None;
            *self.placement.lock().unwrap() = None;
        }
        outcome
    }

    /// React to scroll/resize/content churn: keep the overlay anchored,
    /// flipping sides only when the hysteresis rule says so.
    pub fn layout_changed(&self, signal: LayoutSignal, overlay: Size) -> Reposition {
        let anchor = match self.selection.lock().unwrap().as_ref() {
            Some(selection) => selection.anchor_rect,
            None => return Reposition::NoChange,
        };
        let current = match self.placement.lock().unwrap().clone() {
            Some(placement) => placement,
            None => return Reposition::NoChange,
        };
        debug!(?signal, "recomputing overlay placement");
        let result = geometry::reposition(overlay, anchor, &self.doc.viewport(), &current);
        if let Reposition::Moved(placement) = &result {
            *self.placement.lock().unwrap() = Some(placement.clone());
        }
        result
    }

    fn close_state(&self) {
        // Accept happens from ResultShown, never from pending, so the close
        // request cannot be deferred here.
        let _ = self.machine.lock().unwrap().close_requested();
        *self.selection.lock().unwrap() = None;
        *self.placement.lock().unwrap() = None;
    }

    /// Load secrets and require a present, well-shaped key.
    async fn load_credentialed_secrets(&self) -> refine_core::Result<()> {
        let secrets = self.secrets.load_secrets().await?;
        let key = secrets.gemini_api_key().ok_or(RefineError::NoCredential)?;
        if !refine_core::config::looks_like_gemini_key(key) {
            return Err(RefineError::invalid_credential(
                "configured key does not look like a Gemini API key",
            ));
        }
        Ok(())
    }
}
