//! Request coordinator
//!
//! Decides, for one resource key, whether an analysis must hit the network:
//!
//! 1. A fresh cache entry is returned as is.
//! 2. A pending request for the key is joined; its outcome is shared.
//! 3. Otherwise this caller leads: the fetch runs on its own task, the raw
//!    payload is normalized, the outcome is cached and then published to
//!    every joined caller.
//!
//! The fetch task is detached from its callers. Dropping the future returned
//! by `resolve` stops the wait, never the request, so the cache is populated
//! even when nobody is looking anymore.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::BackendError;
use crate::cache::{AnalysisCache, AnalysisOutcome, CacheStats, ResourceKey};
use crate::config::{BackendConfig, CacheConfig};
use crate::metrics::HoverMetrics;
use crate::normalizer::normalize;
use crate::request_coalescing::{InFlightRegistry, InFlightSlot, LeaderGuard};

/// Where a resolved outcome came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Fresh cache entry, no network call
    Cache,
    /// Attached to a request another caller started
    Joined,
    /// This call issued the network request
    Fetched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: AnalysisOutcome,
    pub source: ResolutionSource,
}

#[derive(Debug, Clone)]
pub struct RequestCoordinator {
    cache: Arc<AnalysisCache>,
    registry: InFlightRegistry,
    success_ttl: Duration,
    failure_ttl: Option<Duration>,
    request_timeout: Duration,
}

impl RequestCoordinator {
    pub fn new(cache_config: &CacheConfig, backend_config: &BackendConfig) -> Self {
        Self {
            cache: Arc::new(AnalysisCache::new(cache_config.capacity)),
            registry: InFlightRegistry::new(),
            success_ttl: cache_config.ttl(),
            failure_ttl: cache_config.failure_ttl(),
            request_timeout: backend_config.request_timeout(),
        }
    }

    /// Resolve `key`, calling `fetcher` at most once and only if needed
    ///
    /// `fetcher` performs the raw network call. It is moved onto a spawned
    /// task, which is bounded by the request timeout.
    pub async fn resolve<F, Fut>(&self, key: &ResourceKey, fetcher: F) -> Resolution
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, BackendError>> + Send + 'static,
    {
        if let Some(entry) = self.cache.get(key) {
            tracing::debug!(key = %key, "Serving analysis from cache");
            return Resolution {
                outcome: entry.outcome,
                source: ResolutionSource::Cache,
            };
        }

        let guard = match self.registry.acquire(key) {
            InFlightSlot::Follower(waiter) => {
                HoverMetrics::global().coalesced_joins.inc();
                tracing::debug!(key = %key, "Joining in-flight analysis");
                return Resolution {
                    outcome: waiter.wait().await,
                    source: ResolutionSource::Joined,
                };
            }
            InFlightSlot::Leader(guard) => guard,
        };

        // A previous leader may have cached and released the key between the
        // lookup above and our acquire
        if let Some(entry) = self.cache.peek(key) {
            guard.complete(entry.outcome.clone());
            return Resolution {
                outcome: entry.outcome,
                source: ResolutionSource::Cache,
            };
        }

        let waiter = guard.waiter();
        tokio::spawn(self.clone().run_fetch(guard, fetcher));

        Resolution {
            outcome: waiter.wait().await,
            source: ResolutionSource::Fetched,
        }
    }

    async fn run_fetch<F, Fut>(self, guard: LeaderGuard, fetcher: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, BackendError>>,
    {
        let key = guard.key().clone();
        let metrics = HoverMetrics::global();
        metrics.fetches.inc();

        tracing::info!(key = %key, "Requesting analysis");
        let result = {
            let _timer = metrics.start_fetch_timer();
            tokio::time::timeout(self.request_timeout, fetcher()).await
        };

        let result = result.unwrap_or_else(|_| {
            Err(BackendError::Timeout {
                timeout_ms: self.request_timeout.as_millis() as u64,
            })
        });

        let outcome = match result {
            Ok(raw) => {
                let view = normalize(&raw);
                tracing::info!(
                    key = %key,
                    label = %view.label,
                    risk_level = view.risk_level.as_str(),
                    trust_score = view.trust_score,
                    "Analysis completed"
                );
                AnalysisOutcome::Success(view)
            }
            Err(e) => {
                metrics.fetch_failures.inc();
                tracing::warn!(key = %key, error = %e, "Analysis request failed");
                AnalysisOutcome::failure(e.to_string())
            }
        };

        self.store(&key, &outcome);
        guard.complete(outcome);
    }

    fn store(&self, key: &ResourceKey, outcome: &AnalysisOutcome) {
        let ttl = if outcome.is_success() {
            Some(self.success_ttl)
        } else {
            self.failure_ttl
        };

        if let Some(ttl) = ttl {
            self.cache.insert(key.clone(), outcome.clone(), ttl);
        }
    }

    /// Attach to the pending request for `key` without ever starting one
    ///
    /// Returns None when nothing is in flight.
    pub async fn join(&self, key: &ResourceKey) -> Option<AnalysisOutcome> {
        let waiter = self.registry.subscribe(key)?;
        HoverMetrics::global().coalesced_joins.inc();
        Some(waiter.wait().await)
    }

    /// Fresh cached outcome for `key`, without fetching
    pub fn peek(&self, key: &ResourceKey) -> Option<AnalysisOutcome> {
        self.cache.peek(key).map(|entry| entry.outcome)
    }

    pub fn is_in_flight(&self, key: &ResourceKey) -> bool {
        self.registry.is_in_flight(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.registry.in_flight_count()
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
