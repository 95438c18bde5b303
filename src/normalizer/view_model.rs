//! Canonical view model
//!
//! The single, schema-stable shape the presenter consumes. Only the
//! normalizer builds these; nothing downstream looks at raw payloads.

use serde::Serialize;

use crate::constants::{NEUTRAL_TRUST_SCORE, UNKNOWN_LABEL};

/// Overall risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl RiskLevel {
    /// Parse an explicit risk level string from the backend
    /// Returns None for anything that isn't a recognised level
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" | "moderate" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    /// Infer a level from keywords in a free-form label
    ///
    /// High-risk keywords are checked first so "scam_like" never reads as
    /// anything milder.
    pub fn infer_from_label(label: &str) -> Option<Self> {
        let lower = label.to_ascii_lowercase();
        if lower.contains("high") || lower.contains("scam") {
            Some(RiskLevel::High)
        } else if lower.contains("moderate") || lower.contains("medium") {
            Some(RiskLevel::Medium)
        } else if lower.contains("low") || lower.contains("safe") {
            Some(RiskLevel::Low)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }
}

/// A model output that may not have been computed
///
/// Absent-because-not-computed and computed-as-zero are different facts and
/// must never collapse into each other.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Metric {
    Value(f64),
    #[default]
    Unavailable,
}

impl Metric {
    /// Text shown in the overlay
    pub fn display(self) -> String {
        match self {
            Metric::Value(v) => format!("{:.2}", v),
            Metric::Unavailable => "Unavailable".to_string(),
        }
    }
}

/// One piece of evidence behind the verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceItem {
    pub text: String,
    /// Empty when the backend gave no reason
    pub reason: String,
}

/// Product details, present only for catalog matches or detected products
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub name: String,
    pub brand: String,
    pub category: String,
    /// Never holds the backend's "Not found" sentinel
    pub price: Option<String>,
}

impl ProductInfo {
    pub fn price_display(&self) -> &str {
        self.price.as_deref().unwrap_or("Not detected")
    }
}

/// A policy rule the backend reports as triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTrigger {
    pub id: String,
    pub description: String,
    pub severity: String,
}

/// Which backend response shape a payload was read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Nested shape (`risk_profile`, `explanation_final`, `trust`)
    Legacy,
    /// Flat shape (`final_label`, `risk_score`, `legitimacy_score`)
    Flat,
    /// Nothing recognisable; every field is at its default
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub label: String,
    pub risk_level: RiskLevel,
    /// Always within 0..=100
    pub trust_score: u8,
    pub summary_text: String,
    pub evidence_items: Vec<EvidenceItem>,
    pub product_info: Option<ProductInfo>,
    pub rule_triggers: Vec<RuleTrigger>,
    pub image_text_similarity: Metric,
    pub short_takeaway: Option<String>,
    pub source_reputation: Option<String>,
    /// Backend reported serving this from its own cache
    pub cached_by_backend: bool,
    pub schema: SchemaKind,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            risk_level: RiskLevel::Unknown,
            trust_score: NEUTRAL_TRUST_SCORE,
            summary_text: String::new(),
            evidence_items: Vec::new(),
            product_info: None,
            rule_triggers: Vec::new(),
            image_text_similarity: Metric::Unavailable,
            short_takeaway: None,
            source_reputation: None,
            cached_by_backend: false,
            schema: SchemaKind::Unknown,
        }
    }
}
