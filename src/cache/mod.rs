//! Analysis cache
//!
//! Memoizes finished analysis outcomes keyed by `(resource_id, mode)`:
//! - `entry`: key, outcome and entry types
//! - `memory`: bounded FIFO store with lazy TTL expiry
//! - `stats`: counters snapshot

pub mod entry;
pub mod memory;
pub mod stats;

pub use entry::{AnalysisMode, AnalysisOutcome, CacheEntry, ResourceKey};
pub use memory::AnalysisCache;
pub use stats::CacheStats;
