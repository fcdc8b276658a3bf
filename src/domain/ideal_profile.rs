use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Required,
    Preferred,
    Optional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub name: String,
    pub importance: Importance,
    pub confidence: f32,
}

/// V5's structured target profile (spec.md §3 "IdealProfile (V5)").
/// Not engaged by the v6/v7 pipelines built here, but named by the
/// distilled spec as part of the shared data model, so it is modeled
/// alongside the rest even though no V5-specific component consumes it
/// yet beyond `pipeline::PipelineVariant::V5` accepting one as an
/// optional hint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdealProfile {
    #[serde(default)]
    pub subspecialties: Vec<WeightedTerm>,
    #[serde(default)]
    pub procedures: Vec<WeightedTerm>,
    #[serde(default)]
    pub conditions: Vec<WeightedTerm>,
    #[serde(default)]
    pub clinical_expertise_areas: Vec<String>,
    #[serde(default)]
    pub description_keywords: Vec<String>,
    #[serde(default)]
    pub avoid_subspecialties: Vec<String>,
    #[serde(default)]
    pub avoid_procedures: Vec<String>,
}
