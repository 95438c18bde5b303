// End-to-end hover pipeline: DOM snapshot -> session -> HTTP backend -> overlay

use super::mock_backend::{MockBackend, MockResponse};
use hoverscan::backend::HttpBackend;
use hoverscan::config::Config;
use hoverscan::normalizer::RiskLevel;
use hoverscan::presenter::OverlayState;
use hoverscan::resolver::{DomSnapshot, ElementSpec, TargetId};
use hoverscan::session::{HoverDecision, HoverSession};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn config_for(mock: &MockBackend) -> Config {
    let mut config = Config::default();
    config.backend.base_url = mock.base_url();
    config.backend.request_timeout_secs = 5;
    config.hover.debounce_ms = 50;
    config
}

fn product_page() -> (DomSnapshot, TargetId) {
    let mut dom = DomSnapshot::new();
    let card = dom.add(None, ElementSpec::new("div").bounds(320.0, 480.0));
    let image = dom.add(
        Some(card),
        ElementSpec::new("img")
            .attr("src", "https://x/a.jpg")
            .bounds(200.0, 200.0),
    );
    (dom, image)
}

async fn wait_for_result(session: &HoverSession) -> OverlayState {
    for _ in 0..100 {
        let state = session.presenter().state();
        if matches!(state, OverlayState::Success { .. } | OverlayState::Error { .. }) {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("overlay never left the loading state");
}

#[tokio::test]
async fn test_hover_posts_once_and_reuses_cache() {
    let mock = MockBackend::start(MockResponse::json(json!({
        "final_label": "safe",
        "risk_score": 0.1
    })))
    .await;
    let config = config_for(&mock);
    let backend = HttpBackend::new(config.backend.clone()).unwrap();
    let (session, fired) = HoverSession::new(&config, Arc::new(backend));
    let worker = session.spawn_worker(fired);

    let (dom, image) = product_page();
    let node = dom.node(image).unwrap();

    assert!(matches!(session.pointer_enter(&node), HoverDecision::Armed(_)));
    match wait_for_result(&session).await {
        OverlayState::Success { target, view } => {
            assert_eq!(target, image);
            assert_eq!(view.label, "safe");
            assert_eq!(view.risk_level, RiskLevel::Low);
            assert_eq!(view.trust_score, 90);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["image_url"], "https://x/a.jpg");
    assert_eq!(requests[0].body["consent"], false);

    // Hover again within the TTL
    session.pointer_leave(image, false);
    session.pointer_enter(&node);
    assert!(matches!(wait_for_result(&session).await, OverlayState::Success { .. }));
    assert_eq!(mock.count("POST"), 1, "repeat hover must not hit the network");

    worker.abort();
}

#[tokio::test]
async fn test_consent_toggle_is_a_separate_request() {
    let mock = MockBackend::start(MockResponse::json(json!({
        "cached": false,
        "result": {
            "risk_profile": {"label_final": "Likely scam", "risk_level_final": "high"},
            "explanation_final": {"explanation_text": "Urgency cues", "bullets": ["Only 2 left!"]}
        }
    })))
    .await;
    let config = config_for(&mock);
    let backend = HttpBackend::new(config.backend.clone()).unwrap();
    let (session, fired) = HoverSession::new(&config, Arc::new(backend));
    let worker = session.spawn_worker(fired);

    let (dom, image) = product_page();
    let node = dom.node(image).unwrap();

    session.pointer_enter(&node);
    wait_for_result(&session).await;

    session.pointer_leave(image, false);
    session.set_consent(true);
    session.pointer_enter(&node);
    match wait_for_result(&session).await {
        OverlayState::Success { view, .. } => {
            assert_eq!(view.label, "Likely scam");
            assert_eq!(view.risk_level, RiskLevel::High);
            assert_eq!(view.summary_text, "Urgency cues");
            assert_eq!(view.evidence_items.len(), 1);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].body["consent"], true);

    worker.abort();
}

#[tokio::test]
async fn test_backend_error_is_shown_verbatim() {
    let mock = MockBackend::start(MockResponse::status(502, "upstream vision model unavailable")).await;
    let config = config_for(&mock);
    let backend = HttpBackend::new(config.backend.clone()).unwrap();
    let (session, fired) = HoverSession::new(&config, Arc::new(backend));
    let worker = session.spawn_worker(fired);

    let (dom, image) = product_page();
    session.pointer_enter(&dom.node(image).unwrap());

    match wait_for_result(&session).await {
        OverlayState::Error { message, .. } => {
            assert!(message.contains("upstream vision model unavailable"));
        }
        other => panic!("expected error, got {other:?}"),
    }

    worker.abort();
}

#[tokio::test]
async fn test_direct_analysis_deduplicates_concurrent_calls() {
    let mock = MockBackend::start(
        MockResponse::json(json!({"final_label": "safe"})).delayed(Duration::from_millis(200)),
    )
    .await;
    let config = config_for(&mock);
    let backend = HttpBackend::new(config.backend.clone()).unwrap();
    let (session, _fired) = HoverSession::new(&config, Arc::new(backend));

    let (a, b, c) = tokio::join!(
        session.analyze("https://x/a.jpg"),
        session.analyze("https://x/a.jpg"),
        session.analyze("https://x/a.jpg"),
    );

    assert!(a.outcome.is_success());
    assert_eq!(a.outcome, b.outcome);
    assert_eq!(b.outcome, c.outcome);
    assert_eq!(mock.count("POST"), 1);
}
