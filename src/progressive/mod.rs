pub mod types;

pub use types::{
    CandidateScore, FetchStrategy, IterationDetail, ProgressiveMetadata, ProgressiveResult,
    ProgressiveState, QualityBreakdown, TerminationReason,
};

use std::collections::HashMap;
use std::time::Instant;

use crate::bm25::Index;
use crate::domain::{Checklist, FitCategory, Practitioner, RankingConfig, SessionContext};
use crate::fit_eval;
use crate::llm::LlmClient;
use crate::query_planner::{self, StageAQuery};
use crate::rescorer::{self, RescoreVariant, RescoredCandidate};
use crate::shared::PractitionerId;
use crate::text::tokenize::bm25_tokens;

/// Runs a Stage-A query (either shape) against `index`, returning up to
/// `n` candidate ids ordered by score. A two-query plan runs both legs
/// at the same requested width and unions them (spec.md §4.Q), which
/// keeps the fetch-more step (spec.md §4.P item 4, "ask I for
/// minFetchCount candidates") a single well-defined width regardless of
/// which query shape Q chose.
fn stage_a_candidates(
    index: &Index,
    stage_a_query: &StageAQuery,
    n: usize,
) -> Vec<(PractitionerId, f32)> {
    match stage_a_query {
        StageAQuery::Single { text } => index.top_n(&bm25_tokens(text), n),
        StageAQuery::TwoQuery { patient_text, intent_text, .. } => {
            let patient_leg = index.top_n(&bm25_tokens(patient_text), n);
            let intent_leg = index.top_n(&bm25_tokens(intent_text), n);
            let mut merged = query_planner::union_legs(&patient_leg, &intent_leg);
            merged.truncate(n);
            merged
        }
    }
}

/// `minFetchCount` formula from spec.md §4.P item 4.
fn min_fetch_count(profiles_fetched: usize, batch: usize, pool_size: usize) -> usize {
    let a = profiles_fetched + 2 * batch;
    let b = 3 * batch;
    let c = pool_size.min(profiles_fetched + 5 * batch);
    a.max(b).max(c)
}

fn top3_all_excellent(ranked: &[PractitionerId], state: &ProgressiveState) -> bool {
    if ranked.len() < 3 {
        return false;
    }
    ranked[..3].iter().all(|id| {
        state
            .evaluation_map
            .get(id)
            .map(|record| record.fit_category == FitCategory::Excellent)
            .unwrap_or(false)
    })
}

/// Groups all evaluated candidates into excellent/good/ill-fit, sorts
/// each group by `score_map` descending, concatenates in that order,
/// and truncates to `shortlist_size` (spec.md §4.P item 6).
fn category_rerank(state: &ProgressiveState, shortlist_size: usize) -> Vec<PractitionerId> {
    let mut excellent = Vec::new();
    let mut good = Vec::new();
    let mut ill_fit = Vec::new();

    for (id, record) in &state.evaluation_map {
        let bucket = match record.fit_category {
            FitCategory::Excellent => &mut excellent,
            FitCategory::Good => &mut good,
            FitCategory::IllFit => &mut ill_fit,
        };
        bucket.push(id.clone());
    }

    let score_of = |id: &PractitionerId| state.score_map.get(id).copied().unwrap_or(0.0);
    let iteration_found_of = |id: &PractitionerId| {
        state
            .evaluation_map
            .get(id)
            .map(|record| record.iteration_found)
            .unwrap_or(u32::MAX)
    };
    // `state.evaluation_map` is a `HashMap`, so each bucket starts in an
    // arbitrary, per-instance order; score ties (the common case under
    // heavy pre-filtering, spec.md §4.I) need a stable secondary key to
    // keep the final ordering deterministic (spec.md §8 "downstream
    // ranking MUST be deterministic"). Break ties by iteration found
    // (earlier discovery first), then by id, mirroring how
    // `bm25::Index::top_n` falls back to natural index order.
    for bucket in [&mut excellent, &mut good, &mut ill_fit] {
        bucket.sort_by(|a, b| {
            score_of(b)
                .partial_cmp(&score_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| iteration_found_of(a).cmp(&iteration_found_of(b)))
                .then_with(|| a.as_str().cmp(b.as_str()))
        });
    }

    let mut ranked = Vec::with_capacity(excellent.len() + good.len() + ill_fit.len());
    ranked.extend(excellent);
    ranked.extend(good);
    ranked.extend(ill_fit);
    ranked.truncate(shortlist_size);
    ranked
}

fn scores_from_state(state: &ProgressiveState) -> HashMap<PractitionerId, CandidateScore> {
    state
        .score_map
        .iter()
        .map(|(id, final_score)| {
            let bm25_score = state.bm25_map.get(id).copied().unwrap_or(0.0);
            (id.clone(), CandidateScore { bm25_score, final_score: *final_score })
        })
        .collect()
}

fn merge_evaluation(
    state: &mut ProgressiveState,
    batch: fit_eval::EvaluationBatch,
    rescored: &[RescoredCandidate],
    iteration: u32,
) {
    for candidate in rescored {
        state.score_map.insert(candidate.id.clone(), candidate.final_score);
        state.bm25_map.insert(candidate.id.clone(), candidate.bm25_score);
    }
    for (id, mut record) in batch.records {
        record.iteration_found = *state.iteration_found_map.entry(id.clone()).or_insert(iteration);
        state.evaluation_map.insert(id, record);
    }
}

/// Runs Stage A (BM25) followed by Stage B (rescoring) over a filtered
/// candidate slice with no LLM fit evaluation — the full ranking a v2/v5
/// request needs (spec.md §4.Q/§4.I/§4.R chained), and the same initial
/// step `run` below takes before it starts the progressive loop.
pub fn stage_ab(
    filtered_candidates: &[&Practitioner],
    session_context: &SessionContext,
    checklist: Option<&Checklist>,
    config: &RankingConfig,
) -> Vec<RescoredCandidate> {
    if filtered_candidates.is_empty() {
        return Vec::new();
    }

    let index = Index::build(filtered_candidates, config);
    let stage_a_query = query_planner::plan(session_context, config);
    let ambiguity_variant = if session_context.is_query_ambiguous {
        RescoreVariant::Parallel
    } else {
        RescoreVariant::Sequential
    };

    let ids = stage_a_candidates(&index, &stage_a_query, config.stage_a_top_n);
    let by_id = |id: &PractitionerId| {
        filtered_candidates
            .iter()
            .find(|p| p.id == *id)
            .copied()
            .expect("stage-a id always resolves within the indexed slice")
    };
    let stage_a: Vec<(&Practitioner, f32)> = ids.iter().map(|(id, score)| (by_id(id), *score)).collect();
    rescorer::rescore(&stage_a, session_context, checklist, ambiguity_variant, config)
}

/// Runs the full V6 progressive refinement loop (spec.md §4.P).
///
/// `filtered_candidates` is the already pre-filtered candidate slice
/// (blacklist/specialty/location/etc — spec.md §4.Q's filter chain is
/// assumed to have already run). `deadline`, when set, is checked once
/// per loop iteration and yields `TerminationReason::DeadlineExceeded`
/// if already past (spec.md §5).
pub fn run(
    filtered_candidates: &[&Practitioner],
    session_context: &SessionContext,
    checklist: Option<&Checklist>,
    llm_client: &dyn LlmClient,
    model: &str,
    config: &RankingConfig,
    deadline: Option<Instant>,
) -> ProgressiveResult {
    if filtered_candidates.is_empty() {
        return ProgressiveResult {
            ranked: Vec::new(),
            metadata: ProgressiveMetadata {
                iterations: 0,
                profiles_evaluated: 0,
                profiles_fetched: 0,
                termination_reason: TerminationReason::EmptyResults,
                quality_breakdown: QualityBreakdown::default(),
                per_iteration: Vec::new(),
            },
            scores: HashMap::new(),
            evaluations: HashMap::new(),
        };
    }

    let index = Index::build(filtered_candidates, config);
    let stage_a_query = query_planner::plan(session_context, config);
    let ambiguity_variant = if session_context.is_query_ambiguous {
        RescoreVariant::Parallel
    } else {
        RescoreVariant::Sequential
    };

    let mut state = ProgressiveState::default();
    let mut per_iteration = Vec::new();

    let initial_ids = stage_a_candidates(&index, &stage_a_query, config.stage_a_top_n);
    let by_id = |id: &PractitionerId| {
        filtered_candidates
            .iter()
            .find(|p| p.id == *id)
            .copied()
            .expect("stage-a id always resolves within the indexed slice")
    };
    let initial_stage_a: Vec<(&Practitioner, f32)> = initial_ids
        .iter()
        .map(|(id, score)| (by_id(id), *score))
        .collect();
    let rescored = rescorer::rescore(&initial_stage_a, session_context, checklist, ambiguity_variant, config);
    let shortlist: Vec<&Practitioner> = rescored
        .iter()
        .take(config.shortlist_size)
        .map(|candidate| by_id(&candidate.id))
        .collect();

    state.iteration = 1;
    state.profiles_fetched = initial_ids.len();
    state.profiles_reviewed += shortlist.len();

    match fit_eval::evaluate(&session_context.q_patient, &shortlist, llm_client, config, model) {
        Ok(batch) => {
            merge_evaluation(&mut state, batch, &rescored, state.iteration);
        }
        Err(_) => {
            let ranked = rescored.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
            let scores = rescored
                .iter()
                .map(|c| (c.id.clone(), CandidateScore { bm25_score: c.bm25_score, final_score: c.final_score }))
                .collect();
            return ProgressiveResult {
                ranked,
                metadata: ProgressiveMetadata {
                    iterations: state.iteration,
                    profiles_evaluated: 0,
                    profiles_fetched: state.profiles_fetched,
                    termination_reason: TerminationReason::EvaluationFailed,
                    quality_breakdown: QualityBreakdown::default(),
                    per_iteration: Vec::new(),
                },
                scores,
                evaluations: HashMap::new(),
            };
        }
    }

    let mut ranked = category_rerank(&state, config.shortlist_size);
    per_iteration.push(IterationDetail {
        iteration: state.iteration,
        top3_all_excellent: top3_all_excellent(&ranked, &state),
        breakdown: QualityBreakdown::from_records(state.evaluation_map.values()),
    });

    let termination_reason = loop {
        if top3_all_excellent(&ranked, &state) {
            break TerminationReason::TopKExcellent;
        }
        if state.iteration >= config.max_iterations {
            break TerminationReason::MaxIterations;
        }
        if state.profiles_reviewed >= config.max_profiles_reviewed {
            break TerminationReason::MaxProfilesReviewed;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break TerminationReason::DeadlineExceeded;
            }
        }

        state.iteration += 1;
        let fetch_count = min_fetch_count(state.profiles_fetched, config.batch, filtered_candidates.len());
        let fetched = stage_a_candidates(&index, &stage_a_query, fetch_count);
        let new_ids: Vec<(PractitionerId, f32)> = fetched
            .into_iter()
            .filter(|(id, _)| !state.evaluation_map.contains_key(id))
            .take(config.batch)
            .collect();

        if new_ids.is_empty() {
            break TerminationReason::NoMoreProfiles;
        }
        state.profiles_fetched = state.profiles_fetched.max(fetch_count);

        let remaining_cap = config.max_profiles_reviewed.saturating_sub(state.profiles_reviewed);
        let review_now: Vec<(PractitionerId, f32)> = new_ids.into_iter().take(remaining_cap).collect();
        if review_now.is_empty() {
            break TerminationReason::MaxProfilesReviewed;
        }

        let new_stage_a: Vec<(&Practitioner, f32)> = review_now
            .iter()
            .map(|(id, score)| (by_id(id), *score))
            .collect();
        let new_rescored = rescorer::rescore(&new_stage_a, session_context, checklist, ambiguity_variant, config);
        let new_candidates: Vec<&Practitioner> = new_rescored.iter().map(|c| by_id(&c.id)).collect();
        state.profiles_reviewed += new_candidates.len();

        match fit_eval::evaluate(&session_context.q_patient, &new_candidates, llm_client, config, model) {
            Ok(batch) => merge_evaluation(&mut state, batch, &new_rescored, state.iteration),
            Err(_) => {
                for candidate in &new_rescored {
                    state.score_map.insert(candidate.id.clone(), candidate.final_score);
                    state.bm25_map.insert(candidate.id.clone(), candidate.bm25_score);
                    state.iteration_found_map.entry(candidate.id.clone()).or_insert(state.iteration);
                    state.evaluation_map.entry(candidate.id.clone()).or_insert_with(|| {
                        crate::domain::EvaluationRecord {
                            fit_category: FitCategory::Good,
                            brief_reason: "evaluation unavailable this iteration".to_string(),
                            iteration_found: state.iteration,
                        }
                    });
                }
            }
        }

        ranked = category_rerank(&state, config.shortlist_size);
        per_iteration.push(IterationDetail {
            iteration: state.iteration,
            top3_all_excellent: top3_all_excellent(&ranked, &state),
            breakdown: QualityBreakdown::from_records(state.evaluation_map.values()),
        });
    };

    let scores = scores_from_state(&state);
    let evaluations = state.evaluation_map.clone();
    ProgressiveResult {
        ranked,
        metadata: ProgressiveMetadata {
            iterations: state.iteration,
            profiles_evaluated: state.evaluation_map.len(),
            profiles_fetched: state.profiles_fetched,
            termination_reason,
            quality_breakdown: QualityBreakdown::from_records(state.evaluation_map.values()),
            per_iteration,
        },
        scores,
        evaluations,
    }
}
