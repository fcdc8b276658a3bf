//! Cross-module end-to-end properties for `pipeline::rank` (the seed
//! scenarios and quantified invariants named for the system as a
//! whole, not any single component).

use std::io::Write;
use std::sync::{Arc, Mutex};

use praxis_rank::corpus::Corpus;
use praxis_rank::domain::PractitionerRecord;
use praxis_rank::lexicon::{Lexicon, LexiconPaths};
use praxis_rank::llm::{ChatRequest, LlmClient, LlmError};
use praxis_rank::pipeline::{self, PipelineContext, PipelineVariant, RankRequest};

/// Always fails, so session-context extraction falls back to its
/// documented defaults on every leg. Good enough for the v2 scenarios
/// below, which exercise L/T/I/R/Q rather than C's happy path.
struct NeverRespondsClient;

impl LlmClient for NeverRespondsClient {
    fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::EmptyCompletion)
    }
}

fn record(
    id: &str,
    specialty: &str,
    subspecialties: Vec<&str>,
    expertise: &str,
    blacklisted: bool,
) -> PractitionerRecord {
    PractitionerRecord {
        id: id.to_string(),
        name: format!("Dr {id}"),
        title: String::new(),
        specialty: specialty.to_string(),
        subspecialties: subspecialties.into_iter().map(String::from).collect(),
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
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = [
        dir.path().join("subspecialties.json"),
        dir.path().join("procedures.json"),
        dir.path().join("conditions.json"),
        dir.path().join("taxonomy.json"),
    ];
    let contents: [&[u8]; 4] = [
        br#"{"global": [], "by_specialty": {}}"#,
        br#"{"terms": []}"#,
        br#"{"terms": []}"#,
        br#"{"procedures": [], "conditions": [], "subspecialties": []}"#,
    ];
    for (path, content) in paths.iter().zip(contents.iter()) {
        std::fs::File::create(path).unwrap().write_all(content).unwrap();
    }
    Lexicon::load(LexiconPaths {
        subspecialties: &paths[0],
        procedures: &paths[1],
        conditions: &paths[2],
        taxonomy: &paths[3],
    })
    .expect("load lexicon")
}

fn v2_context(records: Vec<PractitionerRecord>) -> PipelineContext {
    let json = serde_json::to_string(&records).expect("serialize corpus");
    let corpus = Corpus::load_from_str(&json).expect("load corpus");
    PipelineContext {
        corpus: Arc::new(corpus),
        lexicon: Arc::new(empty_lexicon()),
        llm_client: Arc::new(NeverRespondsClient),
        default_config: Default::default(),
        default_model: "gpt-5".to_string(),
        session_cache: None,
    }
}

#[test]
fn blacklisted_practitioner_is_excluded_and_counted() {
    let ctx = v2_context(vec![
        record("x", "Cardiology", vec!["Electrophysiology"], "Procedure: Catheter Ablation", true),
        record("y", "Cardiology", vec!["Electrophysiology"], "Procedure: Catheter Ablation", false),
    ]);
    let request = RankRequest {
        query: "I need SVT ablation".to_string(),
        variant: PipelineVariant::V2,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert!(response.results.iter().all(|r| r.id != "x"));
    assert!(response.query_info.blacklisted_count >= 1);
}

#[test]
fn manual_specialty_override_restricts_to_that_specialty() {
    let ctx = v2_context(vec![
        record("a", "Gynaecology", vec!["General Gynaecology"], "", false),
        record("b", "Cardiology", vec!["Electrophysiology"], "", false),
    ]);
    let request = RankRequest {
        query: "I need a consultation".to_string(),
        specialty: Some("Gynaecology".to_string()),
        variant: PipelineVariant::V2,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert!(response.results.iter().all(|r| r.id == "a"));
    assert!(!response.results.is_empty());
}

#[test]
fn dietitian_corpus_idf_edge_keeps_scores_non_negative() {
    let ctx = v2_context(vec![
        record("dietitian-1", "Dietitian", vec![], "Diabetes, IBS, Obesity", false),
        record("dietitian-2", "Dietitian", vec![], "Diabetes, IBS, Obesity", false),
        record("dietitian-3", "Dietitian", vec![], "Diabetes, IBS, Obesity", false),
    ]);
    let request = RankRequest {
        query: "IBS dietitian".to_string(),
        specialty: Some("Dietitian".to_string()),
        variant: PipelineVariant::V2,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert!(!response.results.is_empty());
    assert!(response.results.iter().all(|r| r.bm25_score >= 0.0 && r.score >= 0.0));
}

#[test]
fn shortlist_size_bounds_result_count_to_the_filtered_pool() {
    let ctx = v2_context(vec![
        record("a", "Cardiology", vec![], "Procedure: Catheter Ablation", false),
        record("b", "Cardiology", vec![], "Procedure: Catheter Ablation", false),
    ]);
    let request = RankRequest {
        query: "I need SVT ablation".to_string(),
        shortlist_size: 50,
        variant: PipelineVariant::V2,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert_eq!(response.results.len(), 2);
}

#[test]
fn empty_corpus_after_filtering_yields_well_formed_empty_response() {
    let ctx = v2_context(vec![record("a", "Cardiology", vec![], "", true)]);
    let request = RankRequest {
        query: "I need a consultation".to_string(),
        variant: PipelineVariant::V2,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert!(response.success);
    assert_eq!(response.total_results, 0);
    assert!(response.results.is_empty());
}

#[test]
fn evaluate_fit_on_v2_attaches_categories_without_the_progressive_loop() {
    struct GoodFitClient;
    impl LlmClient for GoodFitClient {
        fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            if request.system_prompt.contains("fit evaluator") {
                return Ok(r#"{"overall_reason":"fine","per_doctor":[
                    {"id":"a","fit_category":"excellent","brief_reason":"great match"}
                ]}"#
                .to_string());
            }
            Err(LlmError::EmptyCompletion)
        }
    }

    let ctx = PipelineContext {
        llm_client: Arc::new(GoodFitClient),
        ..v2_context(vec![record("a", "Cardiology", vec![], "Procedure: Catheter Ablation", false)])
    };
    let request = RankRequest {
        query: "I need SVT ablation".to_string(),
        variant: PipelineVariant::V2,
        evaluate_fit: true,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert_eq!(response.results.len(), 1);
    assert_eq!(
        response.results[0].fit_category,
        Some(praxis_rank::domain::FitCategory::Excellent)
    );
}

#[test]
fn empty_query_is_a_validation_error() {
    let ctx = v2_context(vec![]);
    let request = RankRequest {
        query: String::new(),
        ..RankRequest::default()
    };
    assert!(pipeline::rank(request, &ctx).is_err());
}

/// A concurrent-safe response queue keyed by an exact tag, used below
/// to drive the 3-leg session-context fan-out deterministically by
/// routing on `system_prompt` content rather than call order (spec.md
/// §4.C's three legs run on independent threads, so call order across
/// legs is not guaranteed).
struct RoutingClient {
    general: Mutex<Vec<String>>,
    clinical: Mutex<Vec<String>>,
    insights: Mutex<Vec<String>>,
}

impl LlmClient for RoutingClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let pool = if request.system_prompt.contains("medical intent classifier") {
            &self.general
        } else if request.system_prompt.contains("clinical intent classifier") {
            &self.clinical
        } else {
            &self.insights
        };
        let mut guard = pool.lock().unwrap();
        if guard.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(guard.remove(0))
    }
}

#[test]
fn low_confidence_symptom_only_query_is_surfaced_as_ambiguous() {
    let client = RoutingClient {
        general: Mutex::new(vec![
            r#"{"goal":"diagnostic_workup","specificity":"symptom_only","confidence":0.4,
            "expansion_terms":["chest","tightness"],"negative_terms":["anxiety"],
            "anchor_phrases":[],"likely_subspecialties":[]}"#
                .to_string(),
        ]),
        clinical: Mutex::new(vec![
            r#"{"primary_intent":"general_cardiology_unclear","expansion_terms":[],
            "negative_terms":["musculoskeletal"],"anchor_phrases":[],
            "likely_subspecialties":[{"name":"General Cardiology","confidence":0.5}]}"#
                .to_string(),
        ]),
        insights: Mutex::new(vec![
            r#"{"symptoms":["chest tightness"],"preferences":[],"urgency":"routine",
            "specialty":"Cardiology","location":null,"summary":null}"#
                .to_string(),
        ]),
    };

    let ctx = PipelineContext {
        llm_client: Arc::new(client),
        ..v2_context(vec![
            record("a", "Cardiology", vec!["General Cardiology"], "Condition: Hypertension", false),
        ])
    };
    let request = RankRequest {
        query: "I've been having chest tightness on and off".to_string(),
        variant: PipelineVariant::V2,
        ..RankRequest::default()
    };
    let response = pipeline::rank(request, &ctx).expect("rank");
    assert!(response.query_info.session_context.is_query_ambiguous);
}
