//! Analysis backend client
//!
//! The only outbound contract of the crate:
//! - `POST {base}/analyze` with `{image_url | image_base64, page_origin, consent}`
//! - `GET /health`, then `GET /docs`, as a liveness probe
//!
//! Responses are returned as raw JSON; shape handling is the normalizer's job.
//! Every failure mode (transport, non-2xx, bad body, timeout) maps to a
//! `BackendError`, whose message the presenter shows verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::cache::ResourceKey;
use crate::config::BackendConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Connection refused, DNS failure, reset, ...
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx status; the body is kept verbatim
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body is not JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// No response within the configured timeout
    #[error("Analysis request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Client could not be built
    #[error("Client configuration error: {0}")]
    Client(String),
}

/// Body of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_text: Option<String>,
    pub page_origin: String,
    pub consent: bool,
}

impl AnalyzeRequest {
    /// Build the request for a resource key
    ///
    /// `data:` URIs travel as `image_base64` (payload after the comma); every
    /// other identifier travels as `image_url`.
    pub fn for_resource(key: &ResourceKey, page_origin: &str) -> Self {
        let (image_url, image_base64) = match inline_base64(&key.resource_id) {
            Some(payload) => (None, Some(payload.to_string())),
            None => (Some(key.resource_id.clone()), None),
        };

        Self {
            image_url,
            image_base64,
            caption_text: None,
            page_origin: page_origin.to_string(),
            consent: key.mode.consent(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        let caption = caption.into();
        self.caption_text = (!caption.trim().is_empty()).then_some(caption);
        self
    }
}

fn inline_base64(resource_id: &str) -> Option<&str> {
    let rest = resource_id.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    meta.ends_with(";base64").then_some(payload)
}

/// Liveness of the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Online,
    Offline,
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendStatus::Online => write!(f, "online"),
            BackendStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Remote analysis service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit one image for analysis and return the raw JSON payload
    async fn analyze(&self, request: AnalyzeRequest) -> Result<Value, BackendError>;

    /// Probe liveness; any failure is `Offline`
    async fn health(&self) -> BackendStatus;
}

/// `reqwest`-backed implementation of `AnalysisBackend`
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Client` if the HTTP client cannot be created.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn map_send_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                timeout_ms: self.config.request_timeout().as_millis() as u64,
            }
        } else {
            BackendError::Transport(err.to_string())
        }
    }

    async fn probe(&self, url: &str, timeout: Duration) -> bool {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Liveness probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<Value, BackendError> {
        let url = self.config.analyze_url();
        tracing::debug!(
            url = %url,
            consent = request.consent,
            inline_image = request.image_base64.is_some(),
            "Posting analysis request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn health(&self) -> BackendStatus {
        let timeout = self.config.health_timeout();
        for path in &self.config.health_paths {
            if self.probe(&self.config.endpoint(path), timeout).await {
                return BackendStatus::Online;
            }
        }
        BackendStatus::Offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AnalysisMode;

    #[test]
    fn test_request_for_url_resource() {
        let key = ResourceKey::new("https://x/a.jpg", AnalysisMode::Standard);
        let request = AnalyzeRequest::for_resource(&key, "https://shop.example");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "image_url": "https://x/a.jpg",
                "page_origin": "https://shop.example",
                "consent": false
            })
        );
    }

    #[test]
    fn test_request_for_data_uri_uses_base64_field() {
        let key = ResourceKey::new("data:image/png;base64,iVBORw0KGgo=", AnalysisMode::EnhancedConsent);
        let request = AnalyzeRequest::for_resource(&key, "");

        assert_eq!(request.image_url, None);
        assert_eq!(request.image_base64.as_deref(), Some("iVBORw0KGgo="));
        assert!(request.consent);
    }

    #[test]
    fn test_non_base64_data_uri_is_sent_as_url() {
        let key = ResourceKey::new("data:image/svg+xml,<svg/>", AnalysisMode::Standard);
        let request = AnalyzeRequest::for_resource(&key, "");
        assert!(request.image_base64.is_none());
        assert_eq!(request.image_url.as_deref(), Some("data:image/svg+xml,<svg/>"));
    }

    #[test]
    fn test_caption_is_skipped_when_blank() {
        let key = ResourceKey::new("https://x/a.jpg", AnalysisMode::Standard);
        let request = AnalyzeRequest::for_resource(&key, "").with_caption("   ");
        assert!(request.caption_text.is_none());

        let request = request.with_caption("50% off today only");
        assert_eq!(request.caption_text.as_deref(), Some("50% off today only"));
    }

    #[test]
    fn test_error_messages() {
        let err = BackendError::Status {
            status: 500,
            body: "{\"detail\":\"boom\"}".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: {\"detail\":\"boom\"}");
        assert_eq!(
            BackendError::Timeout { timeout_ms: 30000 }.to_string(),
            "Analysis request timed out after 30000ms"
        );
    }

    #[test]
    fn test_http_backend_creation() {
        let backend = HttpBackend::new(BackendConfig::default()).expect("should create client");
        assert_eq!(backend.config().analyze_path, "/analyze");
    }

    #[tokio::test]
    async fn test_health_is_offline_when_unreachable() {
        let config = BackendConfig {
            // Port 9 (discard) is essentially never listening locally
            base_url: "http://127.0.0.1:9".to_string(),
            health_timeout_secs: 1,
            ..Default::default()
        };
        let backend = HttpBackend::new(config).unwrap();
        assert_eq!(backend.health().await, BackendStatus::Offline);
    }
}
