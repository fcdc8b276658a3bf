use crate::domain::{Practitioner, RankingConfig, SessionContext};
use crate::text::aliasing::normalize_medical_query;

/// The Stage-A BM25 query shape (spec.md §4.Q): either a single combined
/// query string, or a two-leg union that is later deduplicated by id and
/// ordered by the max of the two normalized scores.
#[derive(Debug, Clone)]
pub enum StageAQuery {
    Single { text: String },
    TwoQuery {
        patient_text: String,
        intent_text: String,
        patient_n: usize,
        intent_n: usize,
    },
}

/// Builds the Stage-A query from the session context (spec.md §4.Q).
pub fn plan(session_context: &SessionContext, config: &RankingConfig) -> StageAQuery {
    let safe_lane: Vec<&str> = session_context
        .safe_lane_terms
        .iter()
        .take(4)
        .map(String::as_str)
        .collect();
    let anchors: Vec<&str> = session_context
        .anchor_phrases
        .iter()
        .take(5)
        .map(String::as_str)
        .collect();

    let mut patient_parts = vec![session_context.q_patient.as_str()];
    patient_parts.extend(safe_lane);
    patient_parts.extend(anchors);
    if config.intent_terms_in_bm25 {
        patient_parts.extend(
            session_context
                .intent_terms
                .iter()
                .take(config.intent_terms_cap)
                .map(String::as_str),
        );
    }
    // Equivalence aliases (spec.md §4.T "normalizeMedicalQuery"), capped
    // at ≤2 by the aliaser itself — appended to the patient leg so
    // abbreviation/spelling-variant forms (e.g. "svt" ->
    // "supraventricular tachycardia") reach BM25 without widening the
    // query with unrelated synonyms.
    let aliases = normalize_medical_query(&session_context.q_patient);
    patient_parts.extend(aliases.iter().map(String::as_str));
    let patient_text = patient_parts.join(" ");

    if !config.stage_a_two_query {
        return StageAQuery::Single { text: patient_text };
    }

    let intent_text = session_context
        .intent_terms
        .iter()
        .take(config.intent_terms_cap)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    StageAQuery::TwoQuery {
        patient_text,
        intent_text,
        patient_n: config.stage_a_two_query_patient_n,
        intent_n: config.stage_a_two_query_intent_n,
    }
}

/// Union two ranked legs by id, keeping the max of their normalized
/// scores per spec.md §4.Q "Two-query union". Scores are normalized
/// against each leg's own maximum before comparison so that a
/// differently-scaled leg doesn't dominate purely from raw magnitude.
pub fn union_legs(
    patient_leg: &[(crate::shared::PractitionerId, f32)],
    intent_leg: &[(crate::shared::PractitionerId, f32)],
) -> Vec<(crate::shared::PractitionerId, f32)> {
    use std::collections::HashMap;

    let patient_max = patient_leg.iter().map(|(_, s)| *s).fold(0.0_f32, f32::max).max(1e-9);
    let intent_max = intent_leg.iter().map(|(_, s)| *s).fold(0.0_f32, f32::max).max(1e-9);

    let mut merged: HashMap<crate::shared::PractitionerId, (usize, f32)> = HashMap::new();
    for (order, (id, score)) in patient_leg.iter().enumerate() {
        let normalized = score / patient_max;
        merged
            .entry(id.clone())
            .and_modify(|(_, existing)| *existing = existing.max(normalized))
            .or_insert((order, normalized));
    }
    for (order, (id, score)) in intent_leg.iter().enumerate() {
        let normalized = score / intent_max;
        merged
            .entry(id.clone())
            .and_modify(|(_, existing)| *existing = existing.max(normalized))
            .or_insert((patient_leg.len() + order, normalized));
    }

    let mut out: Vec<(crate::shared::PractitionerId, usize, f32)> = merged
        .into_iter()
        .map(|(id, (order, score))| (id, order, score))
        .collect();
    out.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    out.into_iter().map(|(id, _, score)| (id, score)).collect()
}

/// A single stage of the pre-ranking filter chain.
pub type FilterPredicate<'a> = Box<dyn Fn(&Practitioner) -> bool + 'a>;

/// Manual specialty selection, when present, fully overrides
/// AI-inferred subspecialty filtering (spec.md §4.Q).
#[derive(Debug, Clone, Default)]
pub struct SpecialtyFilter {
    pub manual_specialty: Option<String>,
    pub min_subspecialty_confidence: f32,
}

/// Runs the seven-stage pre-ranking filter chain in the documented order
/// (spec.md §4.Q): blacklist → specialty → location → insurance →
/// gender → age-group → language. The location/insurance/gender/
/// age-group/language predicates are supplied by the caller since their
/// concrete heuristics are out-of-scope collaborators (spec.md §1);
/// this function owns only the order and the blacklist/specialty
/// stages.
pub struct FilterChain<'a> {
    pub specialty: SpecialtyFilter,
    pub likely_subspecialties: &'a [crate::domain::LikelySubspecialty],
    pub location: Option<FilterPredicate<'a>>,
    pub insurance: Option<FilterPredicate<'a>>,
    pub gender: Option<FilterPredicate<'a>>,
    pub age_group: Option<FilterPredicate<'a>>,
    pub language: Option<FilterPredicate<'a>>,
}

impl<'a> FilterChain<'a> {
    pub fn apply(&self, candidates: &[&'a Practitioner]) -> Vec<&'a Practitioner> {
        let mut stage: Vec<&Practitioner> = candidates.iter().copied().filter(|p| !p.blacklisted).collect();
        stage.retain(|p| self.passes_specialty(p));
        if let Some(predicate) = &self.location {
            stage.retain(|p| predicate(p));
        }
        if let Some(predicate) = &self.insurance {
            stage.retain(|p| predicate(p));
        }
        if let Some(predicate) = &self.gender {
            stage.retain(|p| predicate(p));
        }
        if let Some(predicate) = &self.age_group {
            stage.retain(|p| predicate(p));
        }
        if let Some(predicate) = &self.language {
            stage.retain(|p| predicate(p));
        }
        stage
    }

    fn passes_specialty(&self, practitioner: &Practitioner) -> bool {
        if let Some(manual) = &self.specialty.manual_specialty {
            return practitioner.specialty.eq_ignore_ascii_case(manual);
        }
        if self.likely_subspecialties.is_empty() {
            return true;
        }
        let threshold = self.specialty.min_subspecialty_confidence.max(0.4);
        self.likely_subspecialties.iter().any(|likely| {
            likely.confidence >= threshold
                && practitioner
                    .subspecialties
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&likely.name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LikelySubspecialty, PractitionerRecord, Specificity};
    use crate::shared::PractitionerId;

    fn context(stage_a_two_query: bool) -> (SessionContext, RankingConfig) {
        let mut config = RankingConfig::default();
        config.stage_a_two_query = stage_a_two_query;
        let context = SessionContext {
            q_patient: "I need SVT ablation".to_string(),
            intent_terms: vec!["ablation".to_string(), "arrhythmia".to_string()],
            safe_lane_terms: vec!["arrhythmia".to_string()],
            anchor_phrases: vec!["catheter ablation".to_string()],
            likely_subspecialties: vec![LikelySubspecialty {
                name: "Electrophysiology".to_string(),
                confidence: 0.9,
            }],
            negative_terms: vec![],
            is_query_ambiguous: false,
            goal: None,
            specificity: Specificity::NamedProcedure,
            primary_intent: None,
            confidence: 0.9,
            insights: Default::default(),
            fallback: false,
        };
        (context, config)
    }

    #[test]
    fn single_query_includes_safe_lane_and_anchors() {
        let (context, config) = context(false);
        match plan(&context, &config) {
            StageAQuery::Single { text } => {
                assert!(text.contains("SVT ablation"));
                assert!(text.contains("arrhythmia"));
                assert!(text.contains("catheter ablation"));
            }
            StageAQuery::TwoQuery { .. } => panic!("expected single query"),
        }
    }

    #[test]
    fn single_query_appends_equivalence_aliases() {
        let (context, config) = context(false);
        match plan(&context, &config) {
            StageAQuery::Single { text } => {
                assert!(text.contains("supraventricular tachycardia"));
            }
            StageAQuery::TwoQuery { .. } => panic!("expected single query"),
        }
    }

    #[test]
    fn two_query_union_splits_patient_and_intent_legs() {
        let (context, config) = context(true);
        match plan(&context, &config) {
            StageAQuery::TwoQuery { intent_text, patient_n, intent_n, .. } => {
                assert_eq!(intent_text, "ablation arrhythmia");
                assert_eq!(patient_n, config.stage_a_two_query_patient_n);
                assert_eq!(intent_n, config.stage_a_two_query_intent_n);
            }
            StageAQuery::Single { .. } => panic!("expected two-query"),
        }
    }

    fn practitioner(id: &str, specialty: &str, subspecialties: Vec<&str>, blacklisted: bool) -> Practitioner {
        Practitioner::from_record(PractitionerRecord {
            id: id.to_string(),
            name: format!("Dr {id}"),
            title: String::new(),
            specialty: specialty.to_string(),
            subspecialties: subspecialties.into_iter().map(String::from).collect(),
            procedure_groups: vec![],
            clinical_expertise: String::new(),
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
        })
        .expect("valid practitioner")
    }

    #[test]
    fn blacklisted_practitioners_never_pass_the_chain() {
        let blacklisted = practitioner("a", "Cardiology", vec![], true);
        let chain = FilterChain {
            specialty: SpecialtyFilter::default(),
            likely_subspecialties: &[],
            location: None,
            insurance: None,
            gender: None,
            age_group: None,
            language: None,
        };
        let refs = vec![&blacklisted];
        assert!(chain.apply(&refs).is_empty());
    }

    #[test]
    fn manual_specialty_overrides_ai_inferred_subspecialty() {
        let matches_manual = practitioner("a", "Cardiology", vec!["General Cardiology"], false);
        let matches_ai_only = practitioner("b", "Dermatology", vec!["Electrophysiology"], false);
        let likely = vec![LikelySubspecialty {
            name: "Electrophysiology".to_string(),
            confidence: 0.9,
        }];
        let chain = FilterChain {
            specialty: SpecialtyFilter {
                manual_specialty: Some("Cardiology".to_string()),
                min_subspecialty_confidence: 0.4,
            },
            likely_subspecialties: &likely,
            location: None,
            insurance: None,
            gender: None,
            age_group: None,
            language: None,
        };
        let refs = vec![&matches_manual, &matches_ai_only];
        let result = chain.apply(&refs);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "a");
    }

    #[test]
    fn union_legs_dedups_and_prefers_max_normalized_score() {
        let id_a = PractitionerId::new("a".to_string()).unwrap();
        let id_b = PractitionerId::new("b".to_string()).unwrap();
        let patient_leg = vec![(id_a.clone(), 10.0), (id_b.clone(), 1.0)];
        let intent_leg = vec![(id_b.clone(), 5.0)];
        let merged = union_legs(&patient_leg, &intent_leg);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].0, id_a);
    }
}
