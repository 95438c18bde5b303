//! Cache configuration types.
//!
//! This module defines the analysis cache configuration:
//! - Capacity (FIFO-evicted)
//! - TTL for successful outcomes
//! - Whether and how long failures are cached
//!
//! Failures are cached by default with a short TTL so a failing backend is
//! not hammered by every repeated hover.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_FAILURE_TTL_SECONDS, DEFAULT_TTL_SECONDS};

fn default_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_failure_ttl() -> u64 {
    DEFAULT_FAILURE_TTL_SECONDS
}

fn default_cache_failures() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached outcomes (default: 30)
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// TTL for successful outcomes in seconds (default: 600)
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// TTL for failed outcomes in seconds (default: 10)
    #[serde(default = "default_failure_ttl")]
    pub failure_ttl_secs: u64,
    /// Cache failed outcomes at all (default: true)
    #[serde(default = "default_cache_failures")]
    pub cache_failures: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl(),
            failure_ttl_secs: default_failure_ttl(),
            cache_failures: default_cache_failures(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// TTL for failures, or None when failures are not cached
    pub fn failure_ttl(&self) -> Option<Duration> {
        self.cache_failures
            .then(|| Duration::from_secs(self.failure_ttl_secs))
            .filter(|ttl| !ttl.is_zero())
    }
}
