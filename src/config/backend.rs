//! Backend configuration types.
//!
//! This module defines how the analysis service is reached:
//! - Base URL and analyze path
//! - Liveness probe paths
//! - Request and probe timeouts
//! - The page origin reported with each request
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ANALYZE_PATH, DEFAULT_BACKEND_URL, DEFAULT_HEALTH_PATHS,
    DEFAULT_HEALTH_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

fn default_base_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_analyze_path() -> String {
    DEFAULT_ANALYZE_PATH.to_string()
}

fn default_health_paths() -> Vec<String> {
    DEFAULT_HEALTH_PATHS.iter().map(|p| p.to_string()).collect()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_health_timeout() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the analysis service (default: http://127.0.0.1:8000)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the analyze endpoint (default: /analyze)
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,
    /// Liveness probe paths, tried in order (default: /health, /docs)
    #[serde(default = "default_health_paths")]
    pub health_paths: Vec<String>,
    /// Timeout for one analysis request in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for one liveness probe in seconds (default: 3)
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    /// Origin of the page being browsed, sent as `page_origin`
    #[serde(default)]
    pub page_origin: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            analyze_path: default_analyze_path(),
            health_paths: default_health_paths(),
            request_timeout_secs: default_request_timeout(),
            health_timeout_secs: default_health_timeout(),
            page_origin: String::new(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    /// Join the base URL and a path without doubling or dropping the slash
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn analyze_url(&self) -> String {
        self.endpoint(&self.analyze_path)
    }
}
