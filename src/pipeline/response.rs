use serde::{Deserialize, Serialize};

use crate::domain::{FitCategory, SessionContext};
use crate::progressive::{QualityBreakdown, TerminationReason};

/// Stage-B signal counts surfaced per result (spec.md §6.1
/// `rescoringInfo`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescoringInfo {
    pub rescore_delta: f32,
    pub anchor_hits: usize,
    pub negative_hits: usize,
}

/// One ranked practitioner (spec.md §6.1 `results[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResultItem {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub title: String,
    pub specialty: String,
    pub score: f32,
    pub bm25_score: f32,
    pub rescoring_info: RescoringInfo,
    pub fit_category: Option<FitCategory>,
    pub fit_reason: Option<String>,
    pub iteration_found: Option<u32>,
    pub profile_url: Option<String>,
}

/// A condensed view of the merged `SessionContext` (spec.md §6.1
/// `queryInfo.sessionContext summary`) — the full record minus the
/// insights payload, which callers can fetch separately if needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContextSummary {
    pub goal: Option<String>,
    pub primary_intent: Option<String>,
    pub specificity: crate::domain::Specificity,
    pub confidence: f32,
    pub is_query_ambiguous: bool,
    pub fallback: bool,
}

impl From<&SessionContext> for SessionContextSummary {
    fn from(context: &SessionContext) -> Self {
        Self {
            goal: context.goal.clone(),
            primary_intent: context.primary_intent.clone(),
            specificity: context.specificity,
            confidence: context.confidence,
            is_query_ambiguous: context.is_query_ambiguous,
            fallback: context.fallback,
        }
    }
}

/// `queryInfo` (spec.md §6.1): session-context summary plus the V6/V7
/// progress fields, present only when the variant produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    pub session_context: SessionContextSummary,
    pub iterations: Option<u32>,
    pub profiles_evaluated: Option<usize>,
    pub termination_reason: Option<TerminationReason>,
    pub quality_breakdown: Option<QualityBreakdown>,
    pub blacklisted_count: usize,
}

/// `processingTime` (spec.md §6.1), in whole milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTime {
    pub ranking: u128,
    pub evaluation: u128,
    pub total: u128,
}

/// The `POST /api/rank` response body (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub success: bool,
    pub query: String,
    pub total_results: usize,
    pub results: Vec<RankResultItem>,
    pub query_info: QueryInfo,
    pub processing_time: ProcessingTime,
}
