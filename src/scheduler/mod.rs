// Hover scheduler
//
// Turns pointer churn into at most one analysis job at a time:
// - Debounce: a job fires only after the pointer rested on a target for the window
// - Single armed job: arming a new target cancels the previous one
// - Per-key cooldown: limits network attempts independently of the cache TTL
//
// Cancelling a job only stops its timer. Requests already handed to the
// coordinator keep running.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::cache::{AnalysisOutcome, ResourceKey};
use crate::config::HoverConfig;
use crate::constants::FIRED_JOB_CHANNEL_CAPACITY;
use crate::resolver::TargetId;

/// One-shot cancellation signal shared between the scheduler and a timer task
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A job whose debounce window elapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredJob {
    pub target: TargetId,
    pub key: ResourceKey,
    pub scheduled_at: Instant,
}

/// Pending job, owned by the scheduler until it fires or is cancelled
#[derive(Debug)]
struct HoverJob {
    id: u64,
    target: TargetId,
    key: ResourceKey,
    scheduled_at: Instant,
    cancel: CancelToken,
}

/// Cooldown state of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// No network attempt within the window
    Ready,
    /// Attempted recently; `remaining` until the window closes
    Cooling { remaining: Duration },
}

impl CooldownStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, CooldownStatus::Ready)
    }
}

/// Last network attempt for a key and what it produced
#[derive(Debug)]
struct Attempt {
    at: Instant,
    outcome: Option<AnalysisOutcome>,
}

/// Debounces hover intent into `FiredJob`s
///
/// Created together with the receiving end of its fired-job channel. Must be
/// used from within a tokio runtime, since arming spawns the timer task.
#[derive(Debug)]
pub struct HoverScheduler {
    debounce: Duration,
    cooldown: Duration,
    armed: Arc<Mutex<Option<HoverJob>>>,
    attempts: Mutex<HashMap<ResourceKey, Attempt>>,
    fired_tx: mpsc::Sender<FiredJob>,
    next_job_id: AtomicU64,
}

impl HoverScheduler {
    pub fn new(config: &HoverConfig) -> (Self, mpsc::Receiver<FiredJob>) {
        Self::with_timings(config.debounce(), config.cooldown())
    }

    pub fn with_timings(
        debounce: Duration,
        cooldown: Duration,
    ) -> (Self, mpsc::Receiver<FiredJob>) {
        let (fired_tx, fired_rx) = mpsc::channel(FIRED_JOB_CHANNEL_CAPACITY);
        let scheduler = Self {
            debounce,
            cooldown,
            armed: Arc::new(Mutex::new(None)),
            attempts: Mutex::new(HashMap::new()),
            fired_tx,
            next_job_id: AtomicU64::new(1),
        };
        (scheduler, fired_rx)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Arm a job for `target`, replacing whatever was armed before
    ///
    /// Entering the same target again restarts its debounce window; it still
    /// fires only once.
    pub fn pointer_enter(&self, target: TargetId, key: ResourceKey) {
        let id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelToken::new();
        let job = HoverJob {
            id,
            target,
            key,
            scheduled_at: Instant::now(),
            cancel: cancel.clone(),
        };

        {
            let mut armed = self.armed.lock();
            if let Some(previous) = armed.take() {
                previous.cancel.cancel();
                if previous.target == target {
                    tracing::trace!(target_id = %target, "Re-armed hover job");
                } else {
                    tracing::debug!(
                        cancelled = %previous.target,
                        armed = %target,
                        "Superseded armed hover job"
                    );
                }
            }
            *armed = Some(job);
        }

        let armed = Arc::clone(&self.armed);
        let fired_tx = self.fired_tx.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => {}
                _ = cancel.cancelled() => return,
            }

            let fired = {
                let mut armed = armed.lock();
                match armed.as_ref() {
                    Some(job) if job.id == id && !job.cancel.is_cancelled() => {
                        armed.take().map(|job| FiredJob {
                            target: job.target,
                            key: job.key,
                            scheduled_at: job.scheduled_at,
                        })
                    }
                    _ => None,
                }
            };

            if let Some(job) = fired {
                tracing::debug!(target_id = %job.target, key = %job.key, "Hover job fired");
                if fired_tx.send(job).await.is_err() {
                    tracing::debug!("Fired-job receiver dropped; discarding job");
                }
            }
        });
    }

    /// Cancel the armed job for `target` unless the pointer moved into the overlay
    ///
    /// Returns true if a job was cancelled.
    pub fn pointer_leave(&self, target: TargetId, into_overlay: bool) -> bool {
        if into_overlay {
            return false;
        }
        self.cancel_if(target)
    }

    /// Cancel the armed job for `target` once it is no longer visible
    pub fn viewport_changed(&self, target: TargetId, visible: bool) -> bool {
        if visible {
            return false;
        }
        self.cancel_if(target)
    }

    /// Cancel whatever is armed
    pub fn cancel(&self) -> bool {
        match self.armed.lock().take() {
            Some(job) => {
                job.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn cancel_if(&self, target: TargetId) -> bool {
        let mut armed = self.armed.lock();
        if armed.as_ref().map(|job| job.target) != Some(target) {
            return false;
        }
        if let Some(job) = armed.take() {
            job.cancel.cancel();
            tracing::debug!(target_id = %target, "Cancelled armed hover job");
        }
        true
    }

    pub fn armed_target(&self) -> Option<TargetId> {
        self.armed.lock().as_ref().map(|job| job.target)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.lock().is_some()
    }

    pub fn check_cooldown(&self, key: &ResourceKey) -> CooldownStatus {
        let attempts = self.attempts.lock();
        match attempts.get(key) {
            Some(attempt) => {
                let elapsed = Instant::now().saturating_duration_since(attempt.at);
                if elapsed < self.cooldown {
                    CooldownStatus::Cooling {
                        remaining: self.cooldown - elapsed,
                    }
                } else {
                    CooldownStatus::Ready
                }
            }
            None => CooldownStatus::Ready,
        }
    }

    /// Record a network attempt for `key`, starting its cooldown window
    pub fn record_attempt(&self, key: &ResourceKey) {
        let now = Instant::now();
        let cooldown = self.cooldown;
        let mut attempts = self.attempts.lock();
        attempts.retain(|_, attempt| now.saturating_duration_since(attempt.at) < cooldown);
        attempts.insert(key.clone(), Attempt { at: now, outcome: None });
    }

    /// Remember what the attempt for `key` produced
    ///
    /// Only updates a recorded attempt; keys without one are ignored.
    pub fn record_outcome(&self, key: &ResourceKey, outcome: &AnalysisOutcome) {
        if let Some(attempt) = self.attempts.lock().get_mut(key) {
            attempt.outcome = Some(outcome.clone());
        }
    }

    /// Outcome of the last attempt for `key`, while its window is open
    pub fn last_outcome(&self, key: &ResourceKey) -> Option<AnalysisOutcome> {
        let attempts = self.attempts.lock();
        let attempt = attempts.get(key)?;
        if Instant::now().saturating_duration_since(attempt.at) >= self.cooldown {
            return None;
        }
        attempt.outcome.clone()
    }
}
