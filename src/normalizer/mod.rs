//! Response normalizer
//!
//! Maps any known backend payload into one `ViewModel`. The mapping is a pure,
//! total function: every field has a fallback chain ending in a documented
//! default, so a payload missing every known field still produces a valid
//! view model and nothing here can fail.
//!
//! Field precedence (highest first):
//! - label: `final_label` → `risk_profile.label_final` → `label` → "Unknown"
//! - risk level: explicit level field → keywords in the label → Unknown
//! - trust score: `legitimacy_score * 100` → `(1 - risk_score) * 100` → 50,
//!   clamped to 0..=100
//! - image/text similarity: a number, or `Unavailable` when null/absent
//!
//! Nested paths (`risk_profile.*`, `explanation_final.*`, `trust.*`) belong to
//! the legacy shape and are only read from payloads classified as legacy.

pub mod schema;
pub mod view_model;

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::constants::{NEUTRAL_TRUST_SCORE, PRICE_NOT_FOUND_SENTINEL, UNKNOWN_LABEL};

pub use schema::RawPayload;
pub use view_model::{
    EvidenceItem, Metric, ProductInfo, RiskLevel, RuleTrigger, SchemaKind, ViewModel,
};

type Object = Map<String, Value>;

/// Normalize a raw backend payload
pub fn normalize(raw: &Value) -> ViewModel {
    match RawPayload::probe(raw) {
        RawPayload::Envelope { cached, result } => {
            let mut view = normalize(result);
            view.cached_by_backend |= cached;
            view
        }
        RawPayload::Legacy(root) => build(root, SchemaKind::Legacy),
        RawPayload::Flat(root) => build(root, SchemaKind::Flat),
        RawPayload::Unrecognized(root) => build(root, SchemaKind::Unknown),
        RawPayload::NotAnObject => {
            tracing::debug!("Analysis payload is not a JSON object, using defaults");
            ViewModel::default()
        }
    }
}

/// Where each text field lives in one payload shape, highest precedence first
struct FieldPaths {
    label: &'static [&'static [&'static str]],
    risk_level: &'static [&'static [&'static str]],
    summary: &'static [&'static [&'static str]],
    short_takeaway: &'static [&'static [&'static str]],
    evidence: &'static [&'static [&'static str]],
}

const LEGACY_PATHS: FieldPaths = FieldPaths {
    label: &[&["final_label"], &["risk_profile", "label_final"], &["label"]],
    risk_level: &[
        &["risk_level"],
        &["risk_profile", "risk_level_final"],
        &["explanation_final", "risk_level"],
        &["trust", "risk_level_llm"],
    ],
    summary: &[
        &["explanation_final", "explanation_text"],
        &["summary"],
        &["summary_text"],
        &["explanation", "explanation_text"],
    ],
    short_takeaway: &[
        &["explanation_final", "short_takeaway"],
        &["llm_explanation", "short_takeaway"],
        &["short_takeaway"],
    ],
    evidence: &[
        &["evidence", "risky_phrases"],
        &["explanation_final", "bullets"],
        &["explanation_final", "persuasion", "all_phrases"],
        &["persuasion", "all_phrases"],
        &["llm_explanation", "bullets"],
    ],
};

/// Flat and unrecognised payloads only carry root-level fields
const ROOT_PATHS: FieldPaths = FieldPaths {
    label: &[&["final_label"], &["label"]],
    risk_level: &[&["risk_level"]],
    summary: &[
        &["summary"],
        &["summary_text"],
        &["explanation", "explanation_text"],
    ],
    short_takeaway: &[&["llm_explanation", "short_takeaway"], &["short_takeaway"]],
    evidence: &[
        &["evidence", "risky_phrases"],
        &["persuasion", "all_phrases"],
        &["llm_explanation", "bullets"],
    ],
};

fn build(root: &Object, schema: SchemaKind) -> ViewModel {
    let paths = match schema {
        SchemaKind::Legacy => &LEGACY_PATHS,
        SchemaKind::Flat | SchemaKind::Unknown => &ROOT_PATHS,
    };
    let label = first_text(root, paths.label).unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let risk_level = resolve_risk_level(root, paths.risk_level, &label);

    ViewModel {
        trust_score: resolve_trust_score(root),
        summary_text: first_text(root, paths.summary).unwrap_or_default(),
        evidence_items: collect_evidence(root, paths.evidence),
        product_info: resolve_product(root),
        rule_triggers: collect_rule_triggers(root),
        image_text_similarity: resolve_similarity(root),
        short_takeaway: first_text(root, paths.short_takeaway),
        source_reputation: resolve_source_reputation(root),
        cached_by_backend: bool_at(root, &["cached"]).unwrap_or(false),
        label,
        risk_level,
        schema,
    }
}

// =============================================================================
// Field resolution
// =============================================================================

fn resolve_risk_level(root: &Object, explicit: &[&[&str]], label: &str) -> RiskLevel {
    explicit
        .iter()
        .filter_map(|path| text_at(root, path))
        .find_map(|raw| RiskLevel::parse(&raw))
        .or_else(|| RiskLevel::infer_from_label(label))
        .unwrap_or(RiskLevel::Unknown)
}

fn resolve_trust_score(root: &Object) -> u8 {
    if let Some(legitimacy) = number_at(root, &["legitimacy_score"]) {
        return to_score(legitimacy * 100.0);
    }
    if let Some(risk) = number_at(root, &["risk_score"]) {
        return to_score((1.0 - risk) * 100.0);
    }
    NEUTRAL_TRUST_SCORE
}

fn to_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

fn resolve_similarity(root: &Object) -> Metric {
    [
        &["image_text_similarity"][..],
        &["fusion_consistency", "image_text_similarity"][..],
    ]
    .iter()
    .find_map(|path| number_at(root, path))
    .map(Metric::Value)
    .unwrap_or(Metric::Unavailable)
}

fn resolve_source_reputation(root: &Object) -> Option<String> {
    match lookup(root, &["source_reputation"])? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj
            .get("label")
            .or_else(|| obj.get("level"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Union of the shape's phrase lists, first occurrence wins
fn collect_evidence(root: &Object, sources: &[&[&str]]) -> Vec<EvidenceItem> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .filter_map(|path| lookup(root, path).and_then(Value::as_array))
        .flatten()
        .filter_map(evidence_item)
        .filter(|item| seen.insert(item.text.to_lowercase()))
        .collect()
}

fn evidence_item(value: &Value) -> Option<EvidenceItem> {
    let (text, reason) = match value {
        Value::String(s) => (s.as_str(), ""),
        Value::Object(obj) => {
            let text = obj
                .get("text")
                .or_else(|| obj.get("phrase"))
                .and_then(Value::as_str)?;
            let reason = obj.get("reason").and_then(Value::as_str).unwrap_or("");
            (text, reason)
        }
        _ => return None,
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(EvidenceItem {
        text: text.to_string(),
        reason: reason.trim().to_string(),
    })
}

/// Product details exist only for a catalog match or a detected product name
fn resolve_product(root: &Object) -> Option<ProductInfo> {
    let catalog = lookup(root, &["catalog_match"]);
    let catalog_obj = catalog.and_then(Value::as_object);
    let catalog_matched = match catalog {
        Some(Value::Bool(matched)) => *matched,
        Some(Value::Object(_)) => true,
        _ => false,
    };

    let detected_name = first_meaningful(
        root,
        &[&["vision", "product_name"], &["product_info", "product_name"]],
    );
    let catalog_name = catalog_obj
        .and_then(|c| c.get("name").or_else(|| c.get("product_name")))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| is_meaningful(s))
        .map(str::to_string);

    if !catalog_matched && detected_name.is_none() {
        return None;
    }

    let from_catalog = |field: &str| {
        catalog_obj
            .and_then(|c| c.get(field))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| is_meaningful(s))
            .map(str::to_string)
    };

    let name = catalog_name
        .or(detected_name)
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let brand = from_catalog("brand")
        .or_else(|| {
            first_meaningful(
                root,
                &[&["vision", "brand"], &["product_info", "brand_name"]],
            )
        })
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let category = from_catalog("category")
        .or_else(|| {
            first_meaningful(
                root,
                &[&["vision", "category"], &["product_info", "category"]],
            )
        })
        .unwrap_or_else(|| "Unclassified".to_string());

    let price = catalog_obj
        .and_then(|c| c.get("price"))
        .and_then(price_text)
        .or_else(|| lookup(root, &["product_info", "detected_price"]).and_then(price_text))
        .or_else(|| lookup(root, &["product_info", "price"]).and_then(price_text));

    Some(ProductInfo {
        name,
        brand,
        category,
        price,
    })
}

fn price_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case(PRICE_NOT_FOUND_SENTINEL) {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|v| format!("{:.2}", v)),
        _ => None,
    }
}

fn collect_rule_triggers(root: &Object) -> Vec<RuleTrigger> {
    let Some(items) = lookup(root, &["rule_triggers"]).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let field = |names: &[&str]| {
                names
                    .iter()
                    .find_map(|n| obj.get(*n).and_then(Value::as_str))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            };
            let id = field(&["rule_id", "id"]);
            let description = field(&["description", "message"]);
            if id.is_empty() && description.is_empty() {
                return None;
            }
            let severity = field(&["severity"]);
            Some(RuleTrigger {
                id,
                description,
                severity: if severity.is_empty() {
                    "unknown".to_string()
                } else {
                    severity.to_ascii_lowercase()
                },
            })
        })
        .collect()
}

// =============================================================================
// JSON helpers
// =============================================================================

fn lookup<'a>(root: &'a Object, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(root.get(*first)?, |value, segment| value.get(*segment))
}

/// Non-empty trimmed string at `path`
fn text_at(root: &Object, path: &[&str]) -> Option<String> {
    lookup(root, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_text(root: &Object, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| text_at(root, path))
}

/// Like `first_text`, but skips the backend's "Unknown" placeholder
fn first_meaningful(root: &Object, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| text_at(root, path))
        .find(|s| is_meaningful(s))
}

fn is_meaningful(s: &str) -> bool {
    !s.is_empty() && !s.eq_ignore_ascii_case(UNKNOWN_LABEL) && !s.eq_ignore_ascii_case("none")
}

/// Finite number at `path`; numeric strings are accepted, null is absent
fn number_at(root: &Object, path: &[&str]) -> Option<f64> {
    let number = match lookup(root, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn bool_at(root: &Object, path: &[&str]) -> Option<bool> {
    lookup(root, path).and_then(Value::as_bool)
}
