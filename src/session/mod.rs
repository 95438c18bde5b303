// Hover session
//
// Wires the pipeline for one page:
//   pointer event -> resolver -> scheduler -> (fired job) -> coordinator -> presenter
//
// The session is cheap to clone; clones share the same scheduler, cache and
// overlay. Fired jobs are consumed by `run`, each on its own task, so a slow
// analysis never delays the next hover.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::backend::{AnalysisBackend, AnalyzeRequest, BackendError, BackendStatus};
use crate::cache::{AnalysisMode, AnalysisOutcome, ResourceKey};
use crate::config::Config;
use crate::coordinator::{RequestCoordinator, Resolution};
use crate::metrics::HoverMetrics;
use crate::presenter::OverlayPresenter;
use crate::resolver::{HoverTarget, ResourceResolver, TargetId};
use crate::scheduler::{CooldownStatus, FiredJob, HoverScheduler};

/// What a pointer-enter led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverDecision {
    /// Target is smaller than the minimum size
    TooSmall,
    /// No image could be found on or around the target
    NotAnalyzable,
    /// A debounce timer was armed for this key
    Armed(ResourceKey),
    /// The key was already in flight; the overlay follows that request
    Attached(ResourceKey),
}

struct SessionInner {
    resolver: ResourceResolver,
    scheduler: HoverScheduler,
    coordinator: RequestCoordinator,
    presenter: OverlayPresenter,
    backend: Arc<dyn AnalysisBackend>,
    page_origin: String,
    consent: AtomicBool,
}

#[derive(Clone)]
pub struct HoverSession {
    inner: Arc<SessionInner>,
}

impl HoverSession {
    /// Build a session and the receiver its fired jobs arrive on
    ///
    /// Hand the receiver to `run` (or `spawn_worker`) to process hovers.
    pub fn new(config: &Config, backend: Arc<dyn AnalysisBackend>) -> (Self, mpsc::Receiver<FiredJob>) {
        let (scheduler, fired) = HoverScheduler::new(&config.hover);
        let inner = SessionInner {
            resolver: ResourceResolver::new(&config.hover),
            scheduler,
            coordinator: RequestCoordinator::new(&config.cache, &config.backend),
            presenter: OverlayPresenter::new(),
            backend,
            page_origin: config.backend.page_origin.clone(),
            consent: AtomicBool::new(config.hover.consent),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            fired,
        )
    }

    pub fn set_consent(&self, consent: bool) {
        self.inner.consent.store(consent, Ordering::Relaxed);
    }

    pub fn mode(&self) -> AnalysisMode {
        AnalysisMode::from_consent(self.inner.consent.load(Ordering::Relaxed))
    }

    /// Handle the pointer entering `target`
    pub fn pointer_enter<T: HoverTarget>(&self, target: &T) -> HoverDecision {
        let inner = &self.inner;
        if !inner.resolver.is_qualifying(target) {
            return HoverDecision::TooSmall;
        }

        let Some(resource_id) = inner.resolver.resolve(target) else {
            tracing::trace!(target_id = %target.id(), "No analysable image under pointer");
            return HoverDecision::NotAnalyzable;
        };

        let key = ResourceKey::new(resource_id, self.mode());
        let target_id = target.id();

        if inner.coordinator.is_in_flight(&key) {
            tracing::debug!(target_id = %target_id, key = %key, "Hovered key already in flight");
            inner.scheduler.cancel();
            inner.presenter.position(target_id);
            inner.presenter.show_loading(target_id);

            let session = self.clone();
            let join_key = key.clone();
            tokio::spawn(async move {
                let outcome = session.inner.coordinator.join(&join_key).await;
                let outcome = outcome.or_else(|| session.inner.coordinator.peek(&join_key));
                if let Some(outcome) = outcome {
                    session.inner.presenter.apply(target_id, &outcome);
                }
            });
            return HoverDecision::Attached(key);
        }

        inner.presenter.position(target_id);
        inner.scheduler.pointer_enter(target_id, key.clone());
        HoverDecision::Armed(key)
    }

    /// Handle the pointer leaving `target`
    pub fn pointer_leave(&self, target: TargetId, into_overlay: bool) {
        self.inner.scheduler.pointer_leave(target, into_overlay);
        if !into_overlay {
            self.inner.presenter.hide_for(target);
        }
    }

    /// Handle `target` scrolling in or out of the viewport
    pub fn viewport_changed(&self, target: TargetId, visible: bool) {
        self.inner.scheduler.viewport_changed(target, visible);
        if !visible {
            self.inner.presenter.hide_for(target);
        }
    }

    /// Process one fired job through cooldown, coordinator and presenter
    ///
    /// Returns the outcome that was produced for the job, or None when the
    /// cooldown suppressed it.
    pub async fn handle_fired(&self, job: FiredJob) -> Option<AnalysisOutcome> {
        let inner = &self.inner;
        let key = &job.key;

        let outcome = match inner.scheduler.check_cooldown(key) {
            CooldownStatus::Ready => {
                inner.presenter.show_loading(job.target);
                if inner.coordinator.peek(key).is_none() && !inner.coordinator.is_in_flight(key) {
                    inner.scheduler.record_attempt(key);
                }
                let outcome = self.resolve(key).await.outcome;
                inner.scheduler.record_outcome(key, &outcome);
                outcome
            }
            CooldownStatus::Cooling { remaining } => match self.reuse_while_cooling(&job).await {
                Some(outcome) => outcome,
                None => {
                    HoverMetrics::global().cooldown_suppressions.inc();
                    tracing::debug!(
                        key = %key,
                        remaining_ms = remaining.as_millis() as u64,
                        "Hover suppressed by cooldown"
                    );
                    return None;
                }
            },
        };

        inner.presenter.apply(job.target, &outcome);
        Some(outcome)
    }

    /// Find an outcome for a cooling key without touching the network
    ///
    /// Order: fresh cache entry, pending request, outcome of the last attempt.
    async fn reuse_while_cooling(&self, job: &FiredJob) -> Option<AnalysisOutcome> {
        let inner = &self.inner;
        let key = &job.key;

        if let Some(outcome) = inner.coordinator.peek(key) {
            inner.presenter.show_loading(job.target);
            return Some(outcome);
        }

        if inner.coordinator.is_in_flight(key) {
            inner.presenter.show_loading(job.target);
            let joined = inner.coordinator.join(key).await;
            return joined
                .or_else(|| inner.coordinator.peek(key))
                .or_else(|| inner.scheduler.last_outcome(key));
        }

        let outcome = inner.scheduler.last_outcome(key)?;
        tracing::debug!(key = %key, "Reusing last outcome while cooling down");
        inner.presenter.show_loading(job.target);
        Some(outcome)
    }

    /// Analyse a resource directly, bypassing debounce and cooldown
    pub async fn analyze(&self, resource_id: &str) -> Resolution {
        let key = ResourceKey::new(resource_id, self.mode());
        self.resolve(&key).await
    }

    async fn resolve(&self, key: &ResourceKey) -> Resolution {
        let backend = Arc::clone(&self.inner.backend);
        let request = AnalyzeRequest::for_resource(key, &self.inner.page_origin);
        let fetcher = move || -> BoxFuture<'static, Result<Value, BackendError>> {
            Box::pin(async move { backend.analyze(request).await })
        };
        self.inner.coordinator.resolve(key, fetcher).await
    }

    pub async fn health(&self) -> BackendStatus {
        self.inner.backend.health().await
    }

    /// Consume fired jobs until the channel closes
    pub async fn run(&self, mut fired: mpsc::Receiver<FiredJob>) {
        while let Some(job) = fired.recv().await {
            let session = self.clone();
            tokio::spawn(async move {
                session.handle_fired(job).await;
            });
        }
        tracing::debug!("Hover session worker stopped");
    }

    /// Run `run` on a background task
    pub fn spawn_worker(&self, fired: mpsc::Receiver<FiredJob>) -> tokio::task::JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move { session.run(fired).await })
    }

    pub fn presenter(&self) -> &OverlayPresenter {
        &self.inner.presenter
    }

    pub fn scheduler(&self) -> &HoverScheduler {
        &self.inner.scheduler
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.inner.coordinator
    }
}

impl std::fmt::Debug for HoverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoverSession")
            .field("mode", &self.mode())
            .field("page_origin", &self.inner.page_origin)
            .field("overlay", &self.inner.presenter.state().name())
            .finish()
    }
}
