use serde::Deserialize;

use crate::domain::FitCategory;

#[derive(Debug, Clone, Deserialize)]
pub struct FitEvalResponse {
    pub overall_reason: String,
    pub per_doctor: Vec<PerDoctorResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerDoctorResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub practitioner_name: Option<String>,
    #[serde(default)]
    pub fit_category: Option<RawFitCategory>,
    /// The legacy boolean shape (spec.md §4.E: "a legacy boolean
    /// excellent_fit is accepted and translated").
    #[serde(default)]
    pub excellent_fit: Option<bool>,
    #[serde(default)]
    pub brief_reason: String,
}

impl PerDoctorResponse {
    /// Resolves the effective category: explicit `fit_category` wins,
    /// then the legacy `excellent_fit` boolean, then `good` as the
    /// documented default for anything unrecognized.
    pub fn resolved_category(&self) -> FitCategory {
        if let Some(raw) = &self.fit_category {
            return raw.to_fit_category();
        }
        match self.excellent_fit {
            Some(true) => FitCategory::Excellent,
            Some(false) => FitCategory::IllFit,
            None => FitCategory::Good,
        }
    }
}

/// Accepts any of the category spellings a model might produce
/// (kebab-case, snake_case, or the bare words) without rejecting the
/// whole response; anything unrecognized defaults to `good` in
/// `resolved_category`/`to_fit_category` (spec.md §4.E "unknown
/// categories default to good").
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFitCategory {
    Excellent,
    Good,
    #[serde(alias = "ill-fit", alias = "illfit")]
    IllFit,
    #[serde(other)]
    Unknown,
}

impl RawFitCategory {
    pub fn to_fit_category(&self) -> FitCategory {
        match self {
            RawFitCategory::Excellent => FitCategory::Excellent,
            RawFitCategory::Good => FitCategory::Good,
            RawFitCategory::IllFit => FitCategory::IllFit,
            RawFitCategory::Unknown => FitCategory::Good,
        }
    }
}
