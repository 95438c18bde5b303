// HttpBackend against a live HTTP mock

use super::mock_backend::{MockBackend, MockResponse};
use hoverscan::backend::{AnalysisBackend, AnalyzeRequest, BackendError, BackendStatus, HttpBackend};
use hoverscan::cache::{AnalysisMode, ResourceKey};
use hoverscan::config::BackendConfig;
use serde_json::json;
use std::time::Duration;

fn backend_for(mock: &MockBackend) -> HttpBackend {
    HttpBackend::new(BackendConfig {
        base_url: mock.base_url(),
        page_origin: "https://shop.example".to_string(),
        request_timeout_secs: 2,
        health_timeout_secs: 1,
        ..Default::default()
    })
    .unwrap()
}

fn request(url: &str) -> AnalyzeRequest {
    let key = ResourceKey::new(url, AnalysisMode::Standard);
    AnalyzeRequest::for_resource(&key, "https://shop.example")
}

#[tokio::test]
async fn test_analyze_posts_json_and_returns_payload() {
    let mock = MockBackend::start(MockResponse::json(json!({
        "final_label": "safe",
        "risk_score": 0.1
    })))
    .await;
    let backend = backend_for(&mock);

    let raw = backend.analyze(request("https://x/a.jpg")).await.unwrap();
    assert_eq!(raw["final_label"], "safe");

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("POST /analyze "));
    assert_eq!(
        requests[0].body,
        json!({
            "image_url": "https://x/a.jpg",
            "page_origin": "https://shop.example",
            "consent": false
        })
    );
}

#[tokio::test]
async fn test_non_2xx_body_is_kept_verbatim() {
    let mock = MockBackend::start(MockResponse::status(500, "{\"detail\":\"OCR failed\"}")).await;
    let backend = backend_for(&mock);

    let err = backend.analyze(request("https://x/a.jpg")).await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Status {
            status: 500,
            body: "{\"detail\":\"OCR failed\"}".to_string()
        }
    );
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let mock = MockBackend::start(MockResponse::status(200, "<html>oops</html>")).await;
    let backend = backend_for(&mock);

    let err = backend.analyze(request("https://x/a.jpg")).await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let mock = MockBackend::start(
        MockResponse::json(json!({"final_label": "safe"})).delayed(Duration::from_secs(5)),
    )
    .await;
    let backend = backend_for(&mock);

    let err = backend.analyze(request("https://x/a.jpg")).await.unwrap_err();
    assert_eq!(err, BackendError::Timeout { timeout_ms: 2000 });
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let backend = HttpBackend::new(BackendConfig {
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap();

    let err = backend.analyze(request("https://x/a.jpg")).await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)), "got {err:?}");
    assert_eq!(backend.health().await, BackendStatus::Offline);
}

#[tokio::test]
async fn test_health_online_when_probe_succeeds() {
    let mock = MockBackend::start(MockResponse::json(json!({"status": "ok"}))).await;
    let backend = backend_for(&mock);

    assert_eq!(backend.health().await, BackendStatus::Online);
    assert_eq!(mock.count("GET /health"), 1);
    assert_eq!(mock.count("GET /docs"), 0);
}

#[tokio::test]
async fn test_health_offline_on_error_status() {
    let mock = MockBackend::start(MockResponse::status(503, "down")).await;
    let backend = backend_for(&mock);

    assert_eq!(backend.health().await, BackendStatus::Offline);
    assert_eq!(mock.count("GET /health"), 1);
    assert_eq!(mock.count("GET /docs"), 1);
}
