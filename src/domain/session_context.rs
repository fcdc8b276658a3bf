use serde::{Deserialize, Serialize};

/// A subspecialty inferred from the query with a confidence score
/// (spec.md §3, glossary "Likely subspecialty"). Confidence is always
/// clamped into `[0.4, 1.0]` by the merge step in `session_context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelySubspecialty {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    NamedProcedure,
    ConfirmedDiagnosis,
    SymptomOnly,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Insights {
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

/// The merged, per-request intent record (spec.md §3 "SessionContext").
/// Produced once by `session_context::extract` and consumed read-only by
/// Q/I/R/P/E.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub q_patient: String,
    pub intent_terms: Vec<String>,
    pub safe_lane_terms: Vec<String>,
    pub anchor_phrases: Vec<String>,
    pub likely_subspecialties: Vec<LikelySubspecialty>,
    pub negative_terms: Vec<String>,
    pub is_query_ambiguous: bool,
    pub goal: Option<String>,
    pub specificity: Specificity,
    pub primary_intent: Option<String>,
    pub confidence: f32,
    pub insights: Insights,
    /// True when any of the three extraction legs fell back to its
    /// documented default (spec.md §7 "queryInfo SHOULD surface which
    /// signals fell back").
    pub fallback: bool,
}

impl SessionContext {
    /// `isQueryClear` as spec.md §3 defines it: high confidence and a
    /// specificity that names a concrete procedure or diagnosis.
    pub fn is_query_clear(confidence: f32, specificity: Specificity) -> bool {
        confidence >= 0.75
            && matches!(
                specificity,
                Specificity::NamedProcedure | Specificity::ConfirmedDiagnosis
            )
    }
}
