use serde::Deserialize;

use crate::domain::{LikelySubspecialty, Specificity, Urgency};

/// Raw shape of the "general intent" LLM response (spec.md §4.C item 1).
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralIntentResponse {
    pub goal: String,
    pub specificity: Specificity,
    pub confidence: f32,
    #[serde(default)]
    pub expansion_terms: Vec<String>,
    #[serde(default)]
    pub negative_terms: Vec<String>,
    #[serde(default)]
    pub anchor_phrases: Vec<String>,
    #[serde(default)]
    pub likely_subspecialties: Vec<LikelySubspecialty>,
}

impl GeneralIntentResponse {
    /// The fixed fallback spec.md §4.C item 1 names for any parse/shape
    /// failure on this leg.
    pub fn fallback() -> Self {
        Self {
            goal: "diagnostic_workup".to_string(),
            specificity: Specificity::SymptomOnly,
            confidence: 0.3,
            expansion_terms: Vec::new(),
            negative_terms: Vec::new(),
            anchor_phrases: Vec::new(),
            likely_subspecialties: Vec::new(),
        }
    }
}

/// Raw shape of the "clinical intent" LLM response (spec.md §4.C item 2).
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicalIntentResponse {
    pub primary_intent: String,
    #[serde(default)]
    pub expansion_terms: Vec<String>,
    #[serde(default)]
    pub negative_terms: Vec<String>,
    #[serde(default)]
    pub anchor_phrases: Vec<String>,
    #[serde(default)]
    pub likely_subspecialties: Vec<LikelySubspecialty>,
}

impl ClinicalIntentResponse {
    pub fn fallback(specialty: &str) -> Self {
        Self {
            primary_intent: format!("general_{}_unclear", normalize_specialty(specialty)),
            expansion_terms: Vec::new(),
            negative_terms: Vec::new(),
            anchor_phrases: Vec::new(),
            likely_subspecialties: Vec::new(),
        }
    }
}

fn normalize_specialty(specialty: &str) -> String {
    specialty
        .trim()
        .to_ascii_lowercase()
        .replace(' ', "_")
}

/// Raw shape of the "insights" LLM response (spec.md §4.C item 3).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// The cardiology clinical-intent lanes named in spec.md §4.C item 2,
/// used when the caller's specialty is cardiology; any other specialty
/// falls back to `general_<specialty>_unclear`.
pub const CARDIOLOGY_LANES: &[&str] = &[
    "coronary_ischaemic",
    "arrhythmia_rhythm",
    "structural_valve",
    "heart_failure",
    "prevention_risk",
    "general_cardiology_unclear",
];
