//! Single-in-flight transform request controller.
//!
//! One overlay instance has at most one outstanding request. A submit while
//! one is outstanding is a no-op report, never a queue.

use refine_core::Result;
use refine_core::transform::TransformService;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// The outcome of one submit call.
#[derive(Debug)]
pub enum Submission {
    /// The request ran to completion (success or failure).
    Finished(Result<String>),
    /// Another request was already outstanding; nothing was sent.
    AlreadyInFlight,
}

/// Serializes transform requests for one overlay instance.
pub struct RequestController {
    service: Arc<dyn TransformService>,
    in_flight: Arc<AtomicBool>,
}

impl RequestController {
    pub fn new(service: Arc<dyn TransformService>) -> Self {
        Self {
            service,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a request is currently outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submit `text` for transformation.
    ///
    /// The in-flight flag is released when the request resolves, including
    /// when the future is dropped mid-flight.
    pub async fn submit(&self, text: &str) -> Submission {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("transform request refused: one already in flight");
            return Submission::AlreadyInFlight;
        }
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));
        Submission::Finished(self.service.transform(text).await)
    }
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refine_core::RefineError;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Completes when released, so a test can hold a request open.
    struct GatedService {
        release: Notify,
    }

    #[async_trait::async_trait]
    impl TransformService for GatedService {
        async fn transform(&self, text: &str) -> Result<String> {
            self.release.notified().await;
            Ok(format!("{text} (refined)"))
        }
    }

    struct FailingService;

    #[async_trait::async_trait]
    impl TransformService for FailingService {
        async fn transform(&self, _text: &str) -> Result<String> {
            Err(RefineError::quota_exceeded("out of quota"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_outstanding_is_refused() {
        let service = Arc::new(GatedService {
            release: Notify::new(),
        });
        let controller = Arc::new(RequestController::new(service.clone()));

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit("draft").await }
        });

        // Let the first submit reach the service.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(controller.is_in_flight());
        assert!(matches!(
            controller.submit("draft").await,
            Submission::AlreadyInFlight
        ));

        service.release.notify_one();
        match first.await.unwrap() {
            Submission::Finished(Ok(text)) => assert_eq!(text, "draft (refined)"),
            other => panic!("expected finished submit, got {other:?}"),
        }
        assert!(!controller.is_in_flight());
    }

    #[tokio::test]
    async fn failure_releases_the_in_flight_flag() {
        let controller = RequestController::new(Arc::new(FailingService));

        match controller.submit("draft").await {
            Submission::Finished(Err(RefineError::QuotaExceeded { .. })) => {}
            other => panic!("expected quota failure, got {other:?}"),
        }
        assert!(!controller.is_in_flight());

        // A new submit goes through once the previous one resolved.
        assert!(matches!(
            controller.submit("draft").await,
            Submission::Finished(Err(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submit_releases_the_in_flight_flag() {
        let service = Arc::new(GatedService {
            release: Notify::new(),
        });
        let controller = Arc::new(RequestController::new(service));

        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit("draft").await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(controller.is_in_flight());

        task.abort();
        let _ = task.await;
        assert!(!controller.is_in_flight());
    }
}
