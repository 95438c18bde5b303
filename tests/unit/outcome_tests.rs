// JSON shape of outcomes as printed by the CLI

use hoverscan::cache::AnalysisOutcome;
use hoverscan::normalizer::normalize;
use serde_json::json;

#[test]
fn test_success_outcome_serializes_flat_with_status() {
    let outcome = AnalysisOutcome::Success(normalize(&json!({
        "final_label": "safe",
        "risk_score": 0.1
    })));

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["label"], "safe");
    assert_eq!(value["risk_level"], "low");
    assert_eq!(value["trust_score"], 90);
    assert!(value["image_text_similarity"].is_null());
}

#[test]
fn test_failure_outcome_serializes_message() {
    let outcome = AnalysisOutcome::failure("HTTP 500: boom");

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "failure");
    assert_eq!(value["message"], "HTTP 500: boom");
    assert!(value["at"].is_string());
}

#[test]
fn test_similarity_zero_is_kept_as_number() {
    let view = normalize(&json!({"final_label": "safe", "image_text_similarity": 0.0}));
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["image_text_similarity"], 0.0);
    assert_eq!(view.image_text_similarity.display(), "0.00");
}
