// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Policy thresholds live here rather than inline so config defaults and
// tests agree on a single value.

// =============================================================================
// Backend defaults
// =============================================================================

/// Default analysis backend base URL
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Default analyze endpoint path
pub const DEFAULT_ANALYZE_PATH: &str = "/analyze";

/// Liveness probe paths, tried in order
pub const DEFAULT_HEALTH_PATHS: [&str; 2] = ["/health", "/docs"];

/// Default analysis request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default liveness probe timeout in seconds
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 3;

// =============================================================================
// Cache defaults
// =============================================================================

/// Default number of analysis outcomes kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 30;

/// Default TTL for successful outcomes in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 600;

/// Default TTL for failed outcomes in seconds
pub const DEFAULT_FAILURE_TTL_SECONDS: u64 = 10;

// =============================================================================
// Hover defaults
// =============================================================================

/// Default debounce window between pointer-enter and firing
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Minimum rendered width and height for a hover target to qualify
pub const DEFAULT_MIN_TARGET_SIZE_PX: f64 = 100.0;

/// How many ancestor levels the resolver climbs looking for an image
pub const DEFAULT_MAX_ANCESTOR_DEPTH: usize = 4;

/// Capacity of the fired-job channel between scheduler and session
pub const FIRED_JOB_CHANNEL_CAPACITY: usize = 16;

// =============================================================================
// Normalizer defaults
// =============================================================================

/// Trust score used when the payload carries no usable score
pub const NEUTRAL_TRUST_SCORE: u8 = 50;

/// Label used when no label field is present
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Price sentinel the backend emits when it found no price
pub const PRICE_NOT_FOUND_SENTINEL: &str = "Not found";
