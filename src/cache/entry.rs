//! Cache key and entry types
//!
//! This module defines the core cache entry structures:
//! - `ResourceKey`: Unique identifier for one analyzable unit (resource + mode)
//! - `AnalysisOutcome`: What a finished request produced (view model or failure)
//! - `CacheEntry`: An outcome with its insertion time and TTL

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::normalizer::ViewModel;

/// Analysis mode, derived from the user's consent toggle
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Classic pipeline only
    #[default]
    Standard,
    /// User consented to LLM enhancement
    EnhancedConsent,
}

impl AnalysisMode {
    pub fn from_consent(consent: bool) -> Self {
        if consent {
            AnalysisMode::EnhancedConsent
        } else {
            AnalysisMode::Standard
        }
    }

    pub fn consent(self) -> bool {
        matches!(self, AnalysisMode::EnhancedConsent)
    }
}

/// Cache key for identifying analysis results
/// The same image hovered with different consent toggles yields distinct keys
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Canonical resource identifier (image URL or data URI)
    pub resource_id: String,
    /// Analysis mode
    pub mode: AnalysisMode,
}

impl ResourceKey {
    pub fn new(resource_id: impl Into<String>, mode: AnalysisMode) -> Self {
        Self {
            resource_id: resource_id.into(),
            mode,
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            AnalysisMode::Standard => "standard",
            AnalysisMode::EnhancedConsent => "consent",
        };
        // data URIs can be megabytes long; keep log lines readable
        if self.resource_id.len() > 96 {
            let cut = self
                .resource_id
                .char_indices()
                .take_while(|(i, _)| *i < 96)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            write!(f, "{}:{}...", mode, &self.resource_id[..cut])
        } else {
            write!(f, "{}:{}", mode, self.resource_id)
        }
    }
}

/// Result of one completed analysis request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Backend answered and the payload was normalized
    Success(ViewModel),
    /// Backend was unreachable, timed out, or answered non-2xx
    Failure {
        /// Message surfaced verbatim to the presenter
        message: String,
        /// When the failure was observed
        at: DateTime<Utc>,
    },
}

impl AnalysisOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        AnalysisOutcome::Failure {
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn view_model(&self) -> Option<&ViewModel> {
        match self {
            AnalysisOutcome::Success(vm) => Some(vm),
            AnalysisOutcome::Failure { .. } => None,
        }
    }
}

/// Cache entry holding one outcome
/// Read-only after creation; expiry is checked lazily on lookup
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: ResourceKey,
    pub outcome: AnalysisOutcome,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create a new entry stamped with the current (tokio) time
    pub fn new(key: ResourceKey, outcome: AnalysisOutcome, ttl: Duration) -> Self {
        Self {
            key,
            outcome,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// Valid for reuse iff `now - inserted_at < ttl`
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    /// Remaining lifetime, zero once expired
    pub fn remaining_ttl(&self) -> Duration {
        self.ttl
            .saturating_sub(Instant::now().saturating_duration_since(self.inserted_at))
    }
}
