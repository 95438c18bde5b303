//! In-memory analysis cache
//!
//! `AnalysisCache` is a bounded store with two independent rules:
//! - Expiry: an entry is reusable iff `now - inserted_at < ttl`. This is
//!   checked lazily on lookup; nothing sweeps in the background.
//! - Capacity: inserting past `capacity` evicts the single oldest-inserted
//!   entry. Lookups never promote an entry (FIFO, not LRU).
//!
//! Backed by an `IndexMap` whose iteration order is insertion order, so the
//! eviction victim is always index 0.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::entry::{AnalysisOutcome, CacheEntry, ResourceKey};
use super::stats::{CacheStats, CacheStatsTracker};
use crate::metrics::HoverMetrics;

pub struct AnalysisCache {
    entries: Mutex<IndexMap<ResourceKey, CacheEntry>>,
    capacity: usize,
    stats: CacheStatsTracker,
}

impl AnalysisCache {
    /// Create an empty cache holding at most `capacity` entries
    ///
    /// A capacity of zero is bumped to one; config validation rejects zero
    /// before it gets here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
            capacity,
            stats: CacheStatsTracker::default(),
        }
    }

    /// Get a fresh entry for `key`
    /// Returns None if the key is absent or its TTL has elapsed
    pub fn get(&self, key: &ResourceKey) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &ResourceKey, now: Instant) -> Option<CacheEntry> {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => {
                self.stats.increment_hits();
                HoverMetrics::global().cache_hits.inc();
                Some(entry.clone())
            }
            Some(_) => {
                self.stats.increment_expired();
                HoverMetrics::global().cache_misses.inc();
                None
            }
            None => {
                self.stats.increment_misses();
                HoverMetrics::global().cache_misses.inc();
                None
            }
        }
    }

    /// Insert an outcome for `key`
    ///
    /// Re-inserting an existing key replaces it and moves it to the newest
    /// position, since it is a new entry with a new insertion time. Returns
    /// the key evicted to make room, if any.
    pub fn insert(
        &self,
        key: ResourceKey,
        outcome: AnalysisOutcome,
        ttl: Duration,
    ) -> Option<ResourceKey> {
        let entry = CacheEntry::new(key.clone(), outcome, ttl);
        let mut entries = self.entries.lock();

        entries.shift_remove(&key);

        let mut evicted = None;
        if entries.len() >= self.capacity {
            if let Some((victim, _)) = entries.shift_remove_index(0) {
                self.stats.increment_evictions();
                HoverMetrics::global().cache_evictions.inc();
                tracing::debug!(evicted = %victim, "Evicted oldest cache entry");
                evicted = Some(victim);
            }
        }

        entries.insert(key, entry);
        evicted
    }

    /// Like `get`, but leaves hit/miss counters untouched
    pub fn peek(&self, key: &ResourceKey) -> Option<CacheEntry> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .cloned()
    }

    /// Whether `key` is physically present, fresh or not
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Drop every expired entry, returning how many were removed
    ///
    /// Never called by the coordinator; expired entries otherwise linger until
    /// overwritten or pushed out by capacity.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh_at(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys in insertion order, oldest first
    pub fn keys(&self) -> Vec<ResourceKey> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.len() as u64, self.capacity as u64)
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
