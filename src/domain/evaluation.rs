use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitCategory {
    Excellent,
    Good,
    IllFit,
}

impl FitCategory {
    /// Category sort rank: excellent < good < ill-fit, so ascending
    /// sort places every excellent before every good before every
    /// ill-fit (spec.md §8.6).
    pub fn rank(self) -> u8 {
        match self {
            FitCategory::Excellent => 0,
            FitCategory::Good => 1,
            FitCategory::IllFit => 2,
        }
    }
}

/// Per-candidate record the progressive controller (V6) accumulates
/// across iterations (spec.md §3 "EvaluationRecord (V6)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub fit_category: FitCategory,
    pub brief_reason: String,
    pub iteration_found: u32,
}
