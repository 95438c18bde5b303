// Error types module

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;

/// Centralized error type for the crate's outer surfaces (CLI, session setup)
///
/// Inside the hover pipeline nothing is fatal: resolution misses are `None`,
/// normalization gaps fall back to defaults, and backend failures become
/// cached `Failure` outcomes. This type only shows up where a caller can
/// actually act on it.
#[derive(Debug, Error)]
pub enum HoverscanError {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis backend errors (transport, non-2xx, undecodable body, timeout)
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Logging subsystem could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// Internal errors (task join failures, closed channels)
    #[error("Internal error: {0}")]
    Internal(String),
}
