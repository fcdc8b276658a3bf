use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{EvaluationRecord, FitCategory};
use crate::shared::PractitionerId;

/// Why the progressive controller stopped (spec.md §4.P item 7, plus
/// the deadline addition spec.md §5 "Cancellation & timeouts"
/// anticipates: *"if reached mid-iteration... a new
/// deadline-exceeded"*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    TopKExcellent,
    MaxIterations,
    MaxProfilesReviewed,
    NoMoreProfiles,
    EvaluationFailed,
    EmptyResults,
    DeadlineExceeded,
}

/// Which Stage the fetch-more step draws candidates from (spec.md §4.P
/// item 4: "Default strategy is Stage A only ... Stage B is available
/// as an option").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    #[default]
    StageAOnly,
    StageB,
}

/// Mutable controller state (spec.md §4.P "State"). Kept as plain
/// fields rather than pointers back into the candidate slice, per
/// spec.md §9's design note that the map should be an id→value map, not
/// a structure holding borrowed references.
#[derive(Debug, Clone, Default)]
pub struct ProgressiveState {
    pub iteration: u32,
    pub profiles_fetched: usize,
    pub profiles_reviewed: usize,
    pub evaluation_map: HashMap<PractitionerId, EvaluationRecord>,
    pub score_map: HashMap<PractitionerId, f32>,
    pub bm25_map: HashMap<PractitionerId, f32>,
    pub iteration_found_map: HashMap<PractitionerId, u32>,
}

/// Final BM25/rescored score pair surfaced to `pipeline::rank` for each
/// returned candidate (spec.md §6.1 `score`/`bm25Score`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateScore {
    pub bm25_score: f32,
    pub final_score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub excellent: usize,
    pub good: usize,
    pub ill_fit: usize,
}

impl QualityBreakdown {
    pub fn from_records<'a>(records: impl Iterator<Item = &'a EvaluationRecord>) -> Self {
        let mut breakdown = Self::default();
        for record in records {
            match record.fit_category {
                FitCategory::Excellent => breakdown.excellent += 1,
                FitCategory::Good => breakdown.good += 1,
                FitCategory::IllFit => breakdown.ill_fit += 1,
            }
        }
        breakdown
    }
}

#[derive(Debug, Clone)]
pub struct IterationDetail {
    pub iteration: u32,
    pub top3_all_excellent: bool,
    pub breakdown: QualityBreakdown,
}

#[derive(Debug, Clone)]
pub struct ProgressiveMetadata {
    pub iterations: u32,
    pub profiles_evaluated: usize,
    pub profiles_fetched: usize,
    pub termination_reason: TerminationReason,
    pub quality_breakdown: QualityBreakdown,
    pub per_iteration: Vec<IterationDetail>,
}

#[derive(Debug, Clone)]
pub struct ProgressiveResult {
    pub ranked: Vec<PractitionerId>,
    pub metadata: ProgressiveMetadata,
    pub scores: HashMap<PractitionerId, CandidateScore>,
    /// Per-candidate fit classification, keyed by id — surfaced so a
    /// caller (e.g. `pipeline::rank`) can attach `fit_category`,
    /// `brief_reason`, and `iteration_found` to each result row (spec.md
    /// §6.1 `results[].fit_category`/`fit_reason`/`iteration_found`).
    pub evaluations: HashMap<PractitionerId, EvaluationRecord>,
}
