// In-flight request registry
//
// Deduplicates concurrent analysis requests for the same resource key.
// When several hovers resolve to the same key while a request is pending:
// - First caller (leader): issues the network call, caches the outcome, publishes it
// - Subsequent callers (followers): attach to the leader's channel and receive the same outcome
// - No caller ever triggers a second network call for a pending key

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::cache::{AnalysisOutcome, ResourceKey};

/// Message followers see when a leader vanished without publishing
const ABANDONED_MESSAGE: &str = "Analysis request was abandoned before completing";

/// One outstanding network call
#[derive(Debug)]
struct PendingRequest {
    id: Uuid,
    sender: watch::Sender<Option<AnalysisOutcome>>,
}

/// Tracks in-flight analysis requests, at most one per key
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    in_flight: Arc<Mutex<HashMap<ResourceKey, PendingRequest>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a slot for `key`
    ///
    /// Returns `InFlightSlot::Leader` if no request is pending. The leader must
    /// perform the call and hand the outcome to `LeaderGuard::complete`.
    ///
    /// Returns `InFlightSlot::Follower` if a request is already pending; the
    /// follower awaits the leader's outcome instead of issuing its own call.
    pub fn acquire(&self, key: &ResourceKey) -> InFlightSlot {
        let mut in_flight = self.in_flight.lock();

        if let Some(pending) = in_flight.get(key) {
            return InFlightSlot::Follower(OutcomeWaiter {
                receiver: pending.sender.subscribe(),
            });
        }

        let (sender, _receiver) = watch::channel(None);
        let id = Uuid::new_v4();
        in_flight.insert(
            key.clone(),
            PendingRequest {
                id,
                sender: sender.clone(),
            },
        );

        InFlightSlot::Leader(LeaderGuard {
            key: key.clone(),
            id,
            registry: self.clone(),
            sender,
        })
    }

    /// Attach to a pending request without ever becoming leader
    pub fn subscribe(&self, key: &ResourceKey) -> Option<OutcomeWaiter> {
        self.in_flight.lock().get(key).map(|pending| OutcomeWaiter {
            receiver: pending.sender.subscribe(),
        })
    }

    pub fn is_in_flight(&self, key: &ResourceKey) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    /// Get current number of in-flight requests
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Remove `key` only if it still belongs to request `id`
    fn remove_in_flight(&self, key: &ResourceKey, id: Uuid) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).map(|p| p.id) == Some(id) {
            in_flight.remove(key);
        }
    }
}

/// Result of acquiring a slot
#[derive(Debug)]
pub enum InFlightSlot {
    /// No request was pending - this caller issues the network call
    Leader(LeaderGuard),
    /// A request was pending - await its outcome
    Follower(OutcomeWaiter),
}

impl InFlightSlot {
    pub fn is_leader(&self) -> bool {
        matches!(self, InFlightSlot::Leader(_))
    }
}

/// Handle for awaiting a pending request's outcome
#[derive(Debug)]
pub struct OutcomeWaiter {
    receiver: watch::Receiver<Option<AnalysisOutcome>>,
}

impl OutcomeWaiter {
    /// Wait for the leader to publish
    ///
    /// If the leader is dropped without publishing, followers resolve to a
    /// failure outcome rather than hanging.
    pub async fn wait(mut self) -> AnalysisOutcome {
        let published = self
            .receiver
            .wait_for(Option::is_some)
            .await
            .map(|outcome| outcome.clone());

        match published {
            Ok(Some(outcome)) => outcome,
            _ => AnalysisOutcome::failure(ABANDONED_MESSAGE),
        }
    }
}

/// Guard held by the leader request
/// Dropping it without `complete` releases the key and fails every follower
#[derive(Debug)]
pub struct LeaderGuard {
    key: ResourceKey,
    id: Uuid,
    registry: InFlightRegistry,
    sender: watch::Sender<Option<AnalysisOutcome>>,
}

impl LeaderGuard {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Publish the outcome to every follower and release the key
    ///
    /// Callers store the outcome in the cache before completing, so a caller
    /// arriving after the key is released finds it there.
    pub fn complete(self, outcome: AnalysisOutcome) {
        self.registry.remove_in_flight(&self.key, self.id);
        self.sender.send_replace(Some(outcome));
        // Drop runs next; removal is idempotent and the sender stays published
    }

    /// Wait handle on the leader's own outcome
    pub fn waiter(&self) -> OutcomeWaiter {
        OutcomeWaiter {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        self.registry.remove_in_flight(&self.key, self.id);
    }
}
