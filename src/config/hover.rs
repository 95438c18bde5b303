//! Hover configuration types.
//!
//! This module defines hover scheduling policy:
//! - Debounce window between pointer-enter and firing
//! - Per-key cooldown (independent of cache TTL)
//! - Minimum target size and ancestor search depth for resolution

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_ANCESTOR_DEPTH, DEFAULT_MIN_TARGET_SIZE_PX,
    DEFAULT_TTL_SECONDS,
};

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_min_target_px() -> f64 {
    DEFAULT_MIN_TARGET_SIZE_PX
}

fn default_max_ancestor_depth() -> usize {
    DEFAULT_MAX_ANCESTOR_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoverConfig {
    /// Debounce window in milliseconds (default: 400)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Minimum seconds between network attempts for one key (default: cache TTL)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Minimum rendered width and height of a hover target (default: 100)
    #[serde(default = "default_min_target_px")]
    pub min_target_px: f64,
    /// Ancestor levels searched for an image (default: 4)
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: usize,
    /// Analyse with the consent (LLM-enhanced) mode
    #[serde(default)]
    pub consent: bool,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            cooldown_secs: default_cooldown_secs(),
            min_target_px: default_min_target_px(),
            max_ancestor_depth: default_max_ancestor_depth(),
            consent: false,
        }
    }
}

impl HoverConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
