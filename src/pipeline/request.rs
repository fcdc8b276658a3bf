use serde::{Deserialize, Serialize};

use crate::domain::{IdealProfile, RankingConfig};

fn default_shortlist_size() -> usize {
    10
}

/// Which of the four named ranking behaviors a request runs (spec.md
/// §6.1 `variant`). v2 is Stage A + Stage B only; v5 is the same with
/// an optional `IdealProfile` hint folded into the session context; v6
/// adds the progressive LLM fit-evaluation loop; v7 adds the checklist
/// boost on top of v6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineVariant {
    V2,
    V5,
    V6,
    V7,
}

impl Default for PipelineVariant {
    fn default() -> Self {
        PipelineVariant::V6
    }
}

/// V6-only knobs a caller may override per request (spec.md §6.1 "V6
/// knobs"); absent fields fall back to the active `RankingConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct V6Overrides {
    pub max_iterations: Option<u32>,
    pub max_profiles_reviewed: Option<usize>,
    pub batch: Option<usize>,
}

/// V7-only knobs (spec.md §6.1 "V7 knobs"): whether to run the
/// checklist generator at all (a query with no taxonomy hit produces
/// an empty checklist regardless) and which model to ask.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct V7Overrides {
    pub use_checklist: bool,
    pub checklist_model: Option<String>,
}

impl Default for V7Overrides {
    fn default() -> Self {
        Self {
            use_checklist: true,
            checklist_model: None,
        }
    }
}

/// The `POST /api/rank` request body (spec.md §6.1), deserialized
/// directly so an out-of-scope HTTP layer is a thin serde passthrough
/// in front of `pipeline::rank`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankRequest {
    pub query: String,
    pub messages: Vec<String>,
    pub location: Option<String>,
    #[serde(default = "default_shortlist_size")]
    pub shortlist_size: usize,
    pub specialty: Option<String>,
    pub patient_age_group: Vec<String>,
    pub languages: Vec<String>,
    pub gender: Option<String>,
    pub location_filter: Option<String>,
    pub insurance_preference: Option<String>,
    pub evaluate_fit: bool,
    pub variant: PipelineVariant,
    pub v6: V6Overrides,
    pub v7: V7Overrides,
    /// V5's structured target profile (spec.md §3 "IdealProfile (V5)").
    pub ideal_profile: Option<IdealProfile>,
    pub ranking_config: Option<RankingConfig>,
    pub model: Option<String>,
}

impl Default for RankRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            messages: Vec::new(),
            location: None,
            shortlist_size: default_shortlist_size(),
            specialty: None,
            patient_age_group: Vec::new(),
            languages: Vec::new(),
            gender: None,
            location_filter: None,
            insurance_preference: None,
            evaluate_fit: false,
            variant: PipelineVariant::default(),
            v6: V6Overrides::default(),
            v7: V7Overrides::default(),
            ideal_profile: None,
            ranking_config: None,
            model: None,
        }
    }
}
