//! Backend response shapes
//!
//! The analysis service has shipped several incompatible JSON layouts. Each
//! payload is classified once by a structural probe and the normalizer then
//! matches on the variant instead of sniffing fields ad hoc.

use serde_json::{Map, Value};

/// Fields whose presence marks the nested legacy shape
const LEGACY_MARKERS: [&str; 2] = ["risk_profile", "explanation_final"];

/// Fields whose presence marks the flat shape
const FLAT_MARKERS: [&str; 4] = [
    "final_label",
    "risk_score",
    "legitimacy_score",
    "source_reputation",
];

/// A raw payload classified by shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPayload<'a> {
    /// `{"cached": bool, "result": {...}}` wrapper around a report
    Envelope { cached: bool, result: &'a Value },
    /// Nested shape: `risk_profile` / `explanation_final` / `trust`
    Legacy(&'a Map<String, Value>),
    /// Flat shape: `final_label` / `risk_score` / `legitimacy_score` on the root
    Flat(&'a Map<String, Value>),
    /// An object with none of the known markers
    Unrecognized(&'a Map<String, Value>),
    /// Not a JSON object at all
    NotAnObject,
}

impl<'a> RawPayload<'a> {
    pub fn probe(value: &'a Value) -> Self {
        let Some(root) = value.as_object() else {
            return RawPayload::NotAnObject;
        };

        let has_any = |markers: &[&str]| markers.iter().any(|m| root.contains_key(*m));

        // Legacy wins over flat: a legacy report may also carry a flat label
        if has_any(&LEGACY_MARKERS) {
            return RawPayload::Legacy(root);
        }
        if has_any(&FLAT_MARKERS) {
            return RawPayload::Flat(root);
        }

        if let Some(result) = root.get("result").filter(|r| r.is_object()) {
            let cached = root.get("cached").and_then(Value::as_bool).unwrap_or(false);
            return RawPayload::Envelope { cached, result };
        }

        RawPayload::Unrecognized(root)
    }
}
