pub mod error;
pub mod profile_card;
pub mod response;

pub use error::FitEvalError;
pub use profile_card::ProfileCard;
pub use response::{FitEvalResponse, PerDoctorResponse};

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{EvaluationRecord, Practitioner, RankingConfig};
use crate::llm::{ChatRequest, LlmClient};
use crate::shared::PractitionerId;

/// Result of one fit-evaluator call: the model's overall reasoning plus
/// a per-candidate record keyed by id (spec.md §3 "EvaluationRecord
/// (V6)"). `iteration_found` is always 0 here; the progressive
/// controller stamps the real iteration number when merging.
#[derive(Debug, Clone)]
pub struct EvaluationBatch {
    pub overall_reason: String,
    pub records: HashMap<PractitionerId, EvaluationRecord>,
}

const SYSTEM_PROMPT: &str = "You are a medical practitioner fit evaluator. Given a \
patient query and a list of candidate doctor profile cards, classify each candidate \
into exactly one of {excellent, good, ill-fit} with a one-sentence reason. Respond \
with a single JSON object: {\"overall_reason\": string, \"per_doctor\": [{\"id\": \
string, \"practitioner_name\": string, \"fit_category\": \"excellent\"|\"good\"|\"ill-fit\", \
\"brief_reason\": string}]}. Respond with raw JSON only, no prose, no markdown fences.";

pub fn evaluate(
    query: &str,
    candidates: &[&Practitioner],
    llm_client: &dyn LlmClient,
    config: &RankingConfig,
    model: &str,
) -> Result<EvaluationBatch, FitEvalError> {
    if candidates.is_empty() {
        return Err(FitEvalError::EmptyBatch);
    }

    let cards: Vec<ProfileCard> = candidates
        .iter()
        .map(|p| ProfileCard::build(p, config.description_truncate_chars))
        .collect();

    let user_message = format!(
        "Query: \"{query}\"\n\nCandidates:\n{}",
        cards
            .iter()
            .map(ProfileCard::render)
            .collect::<Vec<_>>()
            .join("\n---\n")
    );

    let request = ChatRequest {
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_message,
        model: model.to_string(),
        max_tokens: 200 + 60 * candidates.len() as u32,
        temperature: 0.0,
        timeout: Duration::from_secs(30),
    };

    let raw = llm_client
        .complete(&request)
        .map_err(|source| FitEvalError::Llm { source })?;
    let parsed: FitEvalResponse = crate::llm::parse_json(&raw)
        .map_err(|err| match err {
            crate::llm::LlmError::InvalidJson { source } => FitEvalError::InvalidJson { source },
            other => FitEvalError::Llm { source: other },
        })?;

    let mut by_name: HashMap<String, &Practitioner> = HashMap::new();
    for candidate in candidates {
        by_name.insert(candidate.name.to_ascii_lowercase(), candidate);
    }

    let mut records = HashMap::new();
    for entry in &parsed.per_doctor {
        let matched = entry
            .id
            .as_deref()
            .and_then(|id| candidates.iter().find(|c| c.id.as_str() == id))
            .or_else(|| {
                entry
                    .practitioner_name
                    .as_deref()
                    .and_then(|name| by_name.get(&name.to_ascii_lowercase()).copied())
            });
        let Some(candidate) = matched else { continue };
        records.insert(
            candidate.id.clone(),
            EvaluationRecord {
                fit_category: entry.resolved_category(),
                brief_reason: entry.brief_reason.clone(),
                iteration_found: 0,
            },
        );
    }

    Ok(EvaluationBatch {
        overall_reason: parsed.overall_reason,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PractitionerRecord;
    use crate::llm::testing::FakeLlmClient;

    fn practitioner(id: &str, name: &str) -> Practitioner {
        Practitioner::from_record(PractitionerRecord {
            id: id.to_string(),
            name: name.to_string(),
            title: String::new(),
            specialty: "Cardiology".to_string(),
            subspecialties: vec![],
            procedure_groups: vec![],
            clinical_expertise: String::new(),
            about: String::new(),
            description: String::new(),
            languages: vec![],
            patient_age_group: vec![],
            gender: None,
            insurance_providers: vec![],
            locations: vec![],
            blacklisted: false,
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
    fn maps_results_back_by_explicit_id() {
        let a = practitioner("a", "Dr A");
        let b = practitioner("b", "Dr B");
        let candidates = vec![&a, &b];
        let response = r#"{"overall_reason":"ok","per_doctor":[
            {"id":"a","practitioner_name":"Dr A","fit_category":"excellent","brief_reason":"great fit"},
            {"id":"b","practitioner_name":"Dr B","fit_category":"ill-fit","brief_reason":"poor fit"}
        ]}"#;
        let client = FakeLlmClient::new(vec![response.to_string()]);
        let config = RankingConfig::default();
        let batch = evaluate("query", &candidates, &client, &config, "gpt-5").expect("evaluate");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.records.get(a.id.as_str()).map(|r| r.fit_category),
            Some(crate::domain::FitCategory::Excellent)
        );
    }

    #[test]
    fn falls_back_to_case_insensitive_name_match_without_id() {
        let a = practitioner("a", "Dr A");
        let candidates = vec![&a];
        let response = r#"{"overall_reason":"ok","per_doctor":[
            {"practitioner_name":"dr a","excellent_fit":true,"brief_reason":"great fit"}
        ]}"#;
        let client = FakeLlmClient::new(vec![response.to_string()]);
        let config = RankingConfig::default();
        let batch = evaluate("query", &candidates, &client, &config, "gpt-5").expect("evaluate");
        assert_eq!(batch.records.len(), 1);
        assert_eq!(
            batch.records.get(a.id.as_str()).map(|r| r.fit_category),
            Some(crate::domain::FitCategory::Excellent)
        );
    }

    #[test]
    fn empty_candidate_batch_is_rejected() {
        let client = FakeLlmClient::new(vec![]);
        let config = RankingConfig::default();
        let err = evaluate("query", &[], &client, &config, "gpt-5").unwrap_err();
        assert!(matches!(err, FitEvalError::EmptyBatch));
    }
}
