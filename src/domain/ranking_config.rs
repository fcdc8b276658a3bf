use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tunable BM25/rescoring weights and pipeline knobs (spec.md §3
/// "RankingConfig"). Every field has a default drawn from spec.md §4;
/// callers may override any subset via `rankingConfig` on a request
/// (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub k1: f32,
    pub b: f32,
    pub field_weights: HashMap<String, f32>,
    pub stage_a_top_n: usize,
    pub intent_terms_in_bm25: bool,
    pub intent_terms_cap: usize,
    pub stage_a_two_query: bool,
    pub stage_a_two_query_patient_n: usize,
    pub stage_a_two_query_intent_n: usize,
    pub anchor_per_match: f32,
    pub anchor_cap: f32,
    pub procedure_per_match: f32,
    pub subspecialty_factor: f32,
    pub subspecialty_cap: f32,
    pub high_signal_1: f32,
    pub high_signal_2: f32,
    pub pathway_1: f32,
    pub pathway_2: f32,
    pub pathway_3: f32,
    pub safe_lane_1: f32,
    pub safe_lane_2: f32,
    pub safe_lane_3_or_more: f32,
    pub negative_mult_1: f32,
    pub negative_mult_2: f32,
    pub negative_mult_4_or_more: f32,
    pub stage_a_negative_penalty: bool,
    pub checklist_match_threshold: f64,
    pub checklist_boost_weight: f64,
    pub description_truncate_chars: usize,
    pub shortlist_size: usize,
    pub target_top_k: usize,
    pub max_iterations: u32,
    pub max_profiles_reviewed: usize,
    pub batch: usize,
    pub max_filter_values: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        let mut field_weights = HashMap::new();
        field_weights.insert("clinical_expertise".to_string(), 3.0);
        field_weights.insert("procedure_groups".to_string(), 2.8);
        field_weights.insert("specialty".to_string(), 2.5);
        field_weights.insert("subspecialties".to_string(), 2.2);
        field_weights.insert("specialty_description".to_string(), 2.0);
        field_weights.insert("description".to_string(), 1.2);
        field_weights.insert("expertise_procedures".to_string(), 2.0);
        field_weights.insert("expertise_conditions".to_string(), 2.0);

        Self {
            k1: 1.5,
            b: 0.75,
            field_weights,
            stage_a_top_n: 50,
            intent_terms_in_bm25: false,
            intent_terms_cap: 8,
            stage_a_two_query: false,
            stage_a_two_query_patient_n: 50,
            stage_a_two_query_intent_n: 30,
            anchor_per_match: 0.2,
            anchor_cap: 0.6,
            procedure_per_match: 0.15,
            subspecialty_factor: 0.4,
            subspecialty_cap: 0.4,
            high_signal_1: 0.3,
            high_signal_2: 0.2,
            pathway_1: 0.15,
            pathway_2: 0.1,
            pathway_3: 0.05,
            safe_lane_1: 0.1,
            safe_lane_2: 0.15,
            safe_lane_3_or_more: 0.2,
            negative_mult_1: 0.85,
            negative_mult_2: 0.7,
            negative_mult_4_or_more: 0.4,
            stage_a_negative_penalty: false,
            checklist_match_threshold: 0.3,
            checklist_boost_weight: 1.2,
            description_truncate_chars: 350,
            shortlist_size: 12,
            target_top_k: 3,
            max_iterations: 5,
            max_profiles_reviewed: 30,
            batch: 12,
            max_filter_values: 20,
        }
    }
}

impl RankingConfig {
    pub fn field_weight(&self, field: &str) -> f32 {
        self.field_weights.get(field).copied().unwrap_or(1.0)
    }
}
