pub mod error;
pub mod request;
pub mod response;

pub use error::PipelineError;
pub use request::{PipelineVariant, RankRequest, V6Overrides, V7Overrides};
pub use response::{
    ProcessingTime, QueryInfo, RankResponse, RankResultItem, RescoringInfo, SessionContextSummary,
};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use sha2::{Digest, Sha256};

use crate::checklist;
use crate::corpus::Corpus;
use crate::domain::{Checklist, IdealProfile, Importance, Practitioner, RankingConfig, SessionContext};
use crate::fit_eval;
use crate::lexicon::Lexicon;
use crate::llm::LlmClient;
use crate::progressive::{self, ProgressiveResult};
use crate::query_planner::{FilterChain, FilterPredicate, SpecialtyFilter};
use crate::rescorer::RescoredCandidate;
use crate::session_context::{self, ExtractConfig};
use crate::shared::PractitionerId;
use crate::text::tokenize::bm25_tokens;

/// Process-wide collaborators `pipeline::rank` needs, shared behind
/// `Arc` across request-scoped work the same way a queue worker shares
/// its provider handles.
pub struct PipelineContext {
    pub corpus: Arc<Corpus>,
    pub lexicon: Arc<Lexicon>,
    pub llm_client: Arc<dyn LlmClient>,
    pub default_config: RankingConfig,
    pub default_model: String,
    /// Optional cache of `query+conversation -> SessionContext`, keyed
    /// by a sha2 digest (spec.md §5, §6.3 "Optional session-context
    /// cache").
    pub session_cache: Option<Arc<RwLock<HashMap<String, SessionContext>>>>,
}

impl PipelineContext {
    fn session_context_for(&self, query: &str, conversation: &str, model: &str) -> SessionContext {
        let cache_key = self.session_cache.as_ref().map(|_| digest_key(query, conversation));

        if let (Some(cache), Some(key)) = (&self.session_cache, &cache_key) {
            if let Ok(guard) = cache.read() {
                if let Some(hit) = guard.get(key) {
                    return hit.clone();
                }
            }
        }

        let extract_config = ExtractConfig {
            specialty: "General".to_string(),
            model: model.to_string(),
            ..ExtractConfig::default()
        };
        let context = session_context::extract(
            query,
            conversation,
            Arc::clone(&self.llm_client),
            Some(Arc::clone(&self.lexicon)),
            &extract_config,
        );

        if let (Some(cache), Some(key)) = (&self.session_cache, cache_key) {
            if let Ok(mut guard) = cache.write() {
                guard.insert(key, context.clone());
            }
        }

        context
    }
}

fn digest_key(query: &str, conversation: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b"\0");
    hasher.update(conversation.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// V5's resolved open question: there is no dedicated V5 ranking
/// component in spec.md §4 — only the data model names `IdealProfile`
/// as "V5's structured target profile". We fold it into the same
/// session context Q/I/R already consume, the same way a clinician's
/// own anchor phrases and likely subspecialties steer Stage A/B,
/// rather than inventing a parallel scoring path. Required/preferred
/// subspecialties raise `likely_subspecialties` (re-capped at 3 after
/// merging, matching `session_context::merge`'s own cap); required/
/// preferred procedures and description keywords extend
/// `anchor_phrases` (capped at 5); avoid-listed subspecialties/
/// procedures extend `negative_terms`, gated on `!is_query_ambiguous`
/// exactly as the AI-derived negative terms already are (spec.md §4.C).
fn blend_ideal_profile(context: &mut SessionContext, ideal: &IdealProfile) {
    for term in &ideal.subspecialties {
        let wanted = matches!(term.importance, Importance::Required | Importance::Preferred);
        if wanted
            && !context
                .likely_subspecialties
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(&term.name))
        {
            context.likely_subspecialties.push(crate::domain::LikelySubspecialty {
                name: term.name.clone(),
                confidence: term.confidence.max(0.4),
            });
        }
    }
    context
        .likely_subspecialties
        .sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    context.likely_subspecialties.truncate(3);

    let anchor_additions = ideal
        .procedures
        .iter()
        .filter(|term| matches!(term.importance, Importance::Required | Importance::Preferred))
        .map(|term| term.name.clone())
        .chain(ideal.description_keywords.iter().cloned());
    for addition in anchor_additions {
        if context.anchor_phrases.len() >= 5 {
            break;
        }
        if !context.anchor_phrases.iter().any(|p| p.eq_ignore_ascii_case(&addition)) {
            context.anchor_phrases.push(addition);
        }
    }

    if !context.is_query_ambiguous {
        for avoid in ideal.avoid_subspecialties.iter().chain(ideal.avoid_procedures.iter()) {
            for token in bm25_tokens(avoid) {
                if !context.negative_terms.contains(&token) {
                    context.negative_terms.push(token);
                }
            }
        }
    }
}

fn build_filter_chain<'a>(request: &RankRequest, session_context: &'a SessionContext) -> FilterChain<'a> {
    let location: Option<FilterPredicate<'a>> = request.location_filter.clone().map(|loc| {
        let loc = loc.to_ascii_lowercase();
        Box::new(move |p: &Practitioner| p.locations.iter().any(|l| l.to_ascii_lowercase().contains(&loc)))
            as FilterPredicate
    });
    let insurance: Option<FilterPredicate<'a>> = request.insurance_preference.clone().map(|preference| {
        let preference = preference.to_ascii_lowercase();
        Box::new(move |p: &Practitioner| {
            p.insurance_providers.iter().any(|i| i.to_ascii_lowercase() == preference)
        }) as FilterPredicate
    });
    let gender: Option<FilterPredicate<'a>> = request.gender.clone().map(|wanted| {
        let wanted = wanted.to_ascii_lowercase();
        Box::new(move |p: &Practitioner| {
            p.gender.as_deref().map(|g| g.to_ascii_lowercase() == wanted).unwrap_or(false)
        }) as FilterPredicate
    });
    let age_group: Option<FilterPredicate<'a>> = if request.patient_age_group.is_empty() {
        None
    } else {
        let wanted: Vec<String> = request.patient_age_group.iter().map(|a| a.to_ascii_lowercase()).collect();
        Some(Box::new(move |p: &Practitioner| {
            p.patient_age_group.iter().any(|a| wanted.contains(&a.to_ascii_lowercase()))
        }) as FilterPredicate)
    };
    let language: Option<FilterPredicate<'a>> = if request.languages.is_empty() {
        None
    } else {
        let wanted: Vec<String> = request.languages.iter().map(|l| l.to_ascii_lowercase()).collect();
        Some(Box::new(move |p: &Practitioner| {
            p.languages.iter().any(|l| wanted.contains(&l.to_ascii_lowercase()))
        }) as FilterPredicate)
    };

    FilterChain {
        specialty: SpecialtyFilter {
            manual_specialty: request.specialty.clone(),
            min_subspecialty_confidence: 0.4,
        },
        likely_subspecialties: &session_context.likely_subspecialties,
        location,
        insurance,
        gender,
        age_group,
        language,
    }
}

fn find_by_id<'a>(candidates: &[&'a Practitioner], id: &PractitionerId) -> Option<&'a Practitioner> {
    candidates.iter().find(|p| p.id == *id).copied()
}

fn build_result_items(
    rescored: &[RescoredCandidate],
    candidates: &[&Practitioner],
    limit: usize,
) -> Vec<RankResultItem> {
    rescored
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(idx, candidate)| {
            let practitioner = find_by_id(candidates, &candidate.id)?;
            Some(RankResultItem {
                rank: idx + 1,
                id: practitioner.id.as_str().to_string(),
                name: practitioner.name.clone(),
                title: practitioner.title.clone(),
                specialty: practitioner.specialty.clone(),
                score: candidate.final_score,
                bm25_score: candidate.bm25_score,
                rescoring_info: RescoringInfo {
                    rescore_delta: candidate.rescore_delta,
                    anchor_hits: candidate.anchor_hits,
                    negative_hits: candidate.negative_hits,
                },
                fit_category: None,
                fit_reason: None,
                iteration_found: None,
                profile_url: None,
            })
        })
        .collect()
}

fn build_progressive_items(
    result: &ProgressiveResult,
    candidates: &[&Practitioner],
    limit: usize,
) -> Vec<RankResultItem> {
    result
        .ranked
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(idx, id)| {
            let practitioner = find_by_id(candidates, id)?;
            let score = result.scores.get(id).copied().unwrap_or_default();
            let evaluation = result.evaluations.get(id);
            Some(RankResultItem {
                rank: idx + 1,
                id: practitioner.id.as_str().to_string(),
                name: practitioner.name.clone(),
                title: practitioner.title.clone(),
                specialty: practitioner.specialty.clone(),
                score: score.final_score,
                bm25_score: score.bm25_score,
                rescoring_info: RescoringInfo {
                    rescore_delta: score.final_score - score.bm25_score,
                    anchor_hits: 0,
                    negative_hits: 0,
                },
                fit_category: evaluation.map(|record| record.fit_category),
                fit_reason: evaluation.map(|record| record.brief_reason.clone()),
                iteration_found: evaluation.map(|record| record.iteration_found),
                profile_url: None,
            })
        })
        .collect()
}

struct ProgressiveExtras {
    iterations: Option<u32>,
    profiles_evaluated: Option<usize>,
    termination_reason: Option<progressive::TerminationReason>,
    quality_breakdown: Option<progressive::QualityBreakdown>,
}

impl Default for ProgressiveExtras {
    fn default() -> Self {
        Self {
            iterations: None,
            profiles_evaluated: None,
            termination_reason: None,
            quality_breakdown: None,
        }
    }
}

impl From<&ProgressiveResult> for ProgressiveExtras {
    fn from(result: &ProgressiveResult) -> Self {
        Self {
            iterations: Some(result.metadata.iterations),
            profiles_evaluated: Some(result.metadata.profiles_evaluated),
            termination_reason: Some(result.metadata.termination_reason),
            quality_breakdown: Some(result.metadata.quality_breakdown.clone()),
        }
    }
}

/// Runs one ranking request end to end (spec.md §6.1): session-context
/// extraction (C), the seven-stage filter chain (Q), then Stage A/B (I,
/// R) alone for v2/v5 or the full progressive loop (P, with E and
/// optionally K) for v6/v7.
pub fn rank(request: RankRequest, ctx: &PipelineContext) -> Result<RankResponse, PipelineError> {
    let start = Instant::now();
    if request.query.trim().is_empty() {
        return Err(PipelineError::EmptyQuery);
    }
    if request.shortlist_size == 0 {
        return Err(PipelineError::InvalidShortlistSize);
    }

    let mut config = request.ranking_config.clone().unwrap_or_else(|| ctx.default_config.clone());
    config.shortlist_size = request.shortlist_size;
    if let Some(max_iterations) = request.v6.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(max_profiles_reviewed) = request.v6.max_profiles_reviewed {
        config.max_profiles_reviewed = max_profiles_reviewed;
    }
    if let Some(batch) = request.v6.batch {
        config.batch = batch;
    }

    let model = request.model.clone().unwrap_or_else(|| ctx.default_model.clone());
    let conversation = request.messages.join("\n");
    let mut session_context = ctx.session_context_for(&request.query, &conversation, &model);

    if request.variant == PipelineVariant::V5 {
        if let Some(ideal_profile) = &request.ideal_profile {
            blend_ideal_profile(&mut session_context, ideal_profile);
        }
    }

    let filter_chain = build_filter_chain(&request, &session_context);
    let active_candidates = ctx.corpus.active_candidates();
    let filtered = filter_chain.apply(&active_candidates);
    let blacklisted_count = ctx.corpus.blacklisted_count();

    let ranking_start = Instant::now();
    let evaluation_start = Instant::now();

    let (results, extras) = if filtered.is_empty() {
        (Vec::new(), ProgressiveExtras::default())
    } else {
        match request.variant {
            PipelineVariant::V2 | PipelineVariant::V5 => {
                let rescored = progressive::stage_ab(&filtered, &session_context, None, &config);
                let mut items = build_result_items(&rescored, &filtered, config.shortlist_size);
                if request.evaluate_fit && !items.is_empty() {
                    let shortlist: Vec<&Practitioner> = items
                        .iter()
                        .filter_map(|item| find_by_id(&filtered, &id_of(&item.id)))
                        .collect();
                    if let Ok(batch) = fit_eval::evaluate(
                        &session_context.q_patient,
                        &shortlist,
                        ctx.llm_client.as_ref(),
                        &config,
                        &model,
                    ) {
                        for item in &mut items {
                            if let Some(record) = batch.records.get(item.id.as_str()) {
                                item.fit_category = Some(record.fit_category);
                                item.fit_reason = Some(record.brief_reason.clone());
                            }
                        }
                    }
                }
                (items, ProgressiveExtras::default())
            }
            PipelineVariant::V6 => {
                let result = progressive::run(
                    &filtered,
                    &session_context,
                    None,
                    ctx.llm_client.as_ref(),
                    &model,
                    &config,
                    None,
                );
                let items = build_progressive_items(&result, &filtered, config.shortlist_size);
                (items, ProgressiveExtras::from(&result))
            }
            PipelineVariant::V7 => {
                let checklist = if request.v7.use_checklist {
                    let checklist_model = request.v7.checklist_model.clone().unwrap_or_else(|| model.clone());
                    checklist::generate(
                        &request.query,
                        ctx.lexicon.as_ref(),
                        ctx.llm_client.as_ref(),
                        &config,
                        &checklist_model,
                    )
                    .map_err(|source| PipelineError::Checklist { source })?
                } else {
                    Checklist::default()
                };
                let result = progressive::run(
                    &filtered,
                    &session_context,
                    Some(&checklist),
                    ctx.llm_client.as_ref(),
                    &model,
                    &config,
                    None,
                );
                let items = build_progressive_items(&result, &filtered, config.shortlist_size);
                (items, ProgressiveExtras::from(&result))
            }
        }
    };

    let ranking_elapsed = ranking_start.elapsed();
    let evaluation_elapsed = if matches!(request.variant, PipelineVariant::V6 | PipelineVariant::V7) {
        evaluation_start.elapsed()
    } else {
        std::time::Duration::ZERO
    };

    let total_results = results.len();
    let response = RankResponse {
        success: true,
        query: request.query.clone(),
        total_results,
        results,
        query_info: QueryInfo {
            session_context: SessionContextSummary::from(&session_context),
            iterations: extras.iterations,
            profiles_evaluated: extras.profiles_evaluated,
            termination_reason: extras.termination_reason,
            quality_breakdown: extras.quality_breakdown,
            blacklisted_count,
        },
        processing_time: ProcessingTime {
            ranking: ranking_elapsed.as_millis(),
            evaluation: evaluation_elapsed.as_millis(),
            total: start.elapsed().as_millis(),
        },
    };

    Ok(response)
}

fn id_of(raw: &str) -> PractitionerId {
    PractitionerId::new(raw.to_string()).expect("result ids are always built from valid practitioner ids")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PractitionerRecord, WeightedTerm};
    use crate::llm::testing::FakeLlmClient;

    fn corpus_with(practitioners: Vec<PractitionerRecord>) -> Corpus {
        let json = serde_json::to_string(&practitioners).expect("serialize");
        Corpus::load_from_str(&json).expect("load corpus")
    }

    fn record(id: &str, subspecialty: &str, expertise: &str, blacklisted: bool) -> PractitionerRecord {
        PractitionerRecord {
            id: id.to_string(),
            name: format!("Dr {id}"),
            title: String::new(),
            specialty: "Cardiology".to_string(),
            subspecialties: vec![subspecialty.to_string()],
            procedure_groups: vec![],
            clinical_expertise: expertise.to_string(),
            about: String::new(),
            description: String::new(),
            languages: vec![],
            patient_age_group: vec![],
            gender: None,
            insurance_providers: vec![],
            locations: vec![],
            blacklisted,
            rating_value: None,
            review_count: None,
            procedures_completed: vec![],
            qualifications: vec![],
            memberships: vec![],
            checklist_profile: None,
            legacy_ids: vec![],
        }
    }

    fn empty_lexicon() -> Lexicon {
        use std::io::Write;
        use tempfile::tempdir;
        let dir = tempdir().expect("tempdir");
        let paths = [
            dir.path().join("subspecialties.json"),
            dir.path().join("procedures.json"),
            dir.path().join("conditions.json"),
            dir.path().join("taxonomy.json"),
        ];
        let contents = [
            br#"{"global": [], "by_specialty": {}}"#.as_slice(),
            br#"{"terms": []}"#.as_slice(),
            br#"{"terms": []}"#.as_slice(),
            br#"{"procedures": [], "conditions": [], "subspecialties": []}"#.as_slice(),
        ];
        for (path, content) in paths.iter().zip(contents.iter()) {
            std::fs::File::create(path).unwrap().write_all(content).unwrap();
        }
        Lexicon::load(crate::lexicon::LexiconPaths {
            subspecialties: &paths[0],
            procedures: &paths[1],
            conditions: &paths[2],
            taxonomy: &paths[3],
        })
        .expect("load lexicon")
    }

    fn context_with(corpus: Corpus, client: FakeLlmClient) -> PipelineContext {
        PipelineContext {
            corpus: Arc::new(corpus),
            lexicon: Arc::new(empty_lexicon()),
            llm_client: Arc::new(client),
            default_config: RankingConfig::default(),
            default_model: "gpt-5".to_string(),
            session_cache: None,
        }
    }

    #[test]
    fn empty_query_is_rejected() {
        let ctx = context_with(corpus_with(vec![]), FakeLlmClient::new(vec![]));
        let request = RankRequest {
            query: "   ".to_string(),
            ..RankRequest::default()
        };
        let err = rank(request, &ctx).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyQuery));
    }

    #[test]
    fn v2_runs_stage_ab_only_and_never_calls_the_fit_evaluator() {
        let corpus = corpus_with(vec![
            record("a", "Electrophysiology", "Procedure: Catheter Ablation", false),
            record("b", "General Cardiology", "Condition: Hypertension", false),
        ]);
        let ctx = context_with(corpus, FakeLlmClient::new(vec![]));
        let request = RankRequest {
            query: "I need SVT ablation".to_string(),
            variant: PipelineVariant::V2,
            shortlist_size: 5,
            ..RankRequest::default()
        };
        let response = rank(request, &ctx).expect("rank");
        assert!(response.success);
        assert!(!response.results.is_empty());
        assert_eq!(response.results[0].id, "a");
        assert!(response.results[0].fit_category.is_none());
    }

    #[test]
    fn blacklisted_practitioner_never_appears_in_results() {
        let corpus = corpus_with(vec![
            record("a", "Electrophysiology", "Procedure: Catheter Ablation", true),
            record("b", "Electrophysiology", "Procedure: Catheter Ablation", false),
        ]);
        let ctx = context_with(corpus, FakeLlmClient::new(vec![]));
        let request = RankRequest {
            query: "I need SVT ablation".to_string(),
            variant: PipelineVariant::V2,
            ..RankRequest::default()
        };
        let response = rank(request, &ctx).expect("rank");
        assert!(response.results.iter().all(|r| r.id != "a"));
        assert_eq!(response.query_info.blacklisted_count, 1);
    }

    #[test]
    fn manual_specialty_overrides_ai_inferred_subspecialty_filter() {
        let corpus = corpus_with(vec![
            record("a", "Electrophysiology", "", false),
            {
                let mut r = record("b", "General Gynaecology", "", false);
                r.specialty = "Gynaecology".to_string();
                r
            },
        ]);
        let ctx = context_with(corpus, FakeLlmClient::new(vec![]));
        let request = RankRequest {
            query: "I need a consultation".to_string(),
            specialty: Some("Gynaecology".to_string()),
            variant: PipelineVariant::V2,
            ..RankRequest::default()
        };
        let response = rank(request, &ctx).expect("rank");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].id, "b");
    }

    #[test]
    fn empty_filtered_pool_yields_empty_results_not_an_error() {
        let corpus = corpus_with(vec![record("a", "Electrophysiology", "", false)]);
        let ctx = context_with(corpus, FakeLlmClient::new(vec![]));
        let request = RankRequest {
            query: "I need a consultation".to_string(),
            specialty: Some("Neurology".to_string()),
            variant: PipelineVariant::V2,
            ..RankRequest::default()
        };
        let response = rank(request, &ctx).expect("rank");
        assert!(response.success);
        assert!(response.results.is_empty());
    }

    #[test]
    fn v5_ideal_profile_required_subspecialty_raises_it_into_the_filter() {
        let corpus = corpus_with(vec![
            record("a", "Electrophysiology", "", false),
            record("b", "General Cardiology", "", false),
        ]);
        let ctx = context_with(corpus, FakeLlmClient::new(vec![]));
        let ideal_profile = IdealProfile {
            subspecialties: vec![WeightedTerm {
                name: "Electrophysiology".to_string(),
                importance: Importance::Required,
                confidence: 0.95,
            }],
            ..IdealProfile::default()
        };
        let request = RankRequest {
            query: "I need a heart specialist".to_string(),
            variant: PipelineVariant::V5,
            ideal_profile: Some(ideal_profile),
            ..RankRequest::default()
        };
        let response = rank(request, &ctx).expect("rank");
        assert!(response.results.iter().any(|r| r.id == "a"));
    }
}
