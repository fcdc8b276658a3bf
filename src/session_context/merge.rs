use crate::domain::{Insights, LikelySubspecialty, SessionContext, Specificity};

use super::types::{ClinicalIntentResponse, GeneralIntentResponse, InsightsResponse};

/// Substrings that mark a term as symptom/condition-oriented (spec.md
/// §4.C "safe_lane_terms ... symptom/condition whitelist").
const SYMPTOM_CONDITION_WHITELIST: &[&str] = &[
    "pain", "ache", "itis", "osis", "emia", "syndrome", "disease", "symptom",
    "fatigue", "swelling", "tightness", "shortness", "palpitation", "dizziness",
];

/// Substrings that mark a term as procedure-heavy (spec.md §4.C
/// "...AND procedure blacklist").
const PROCEDURE_BLACKLIST: &[&str] = &[
    "ectomy", "oscopy", "plasty", "ablation", "surgery", "transplant", "repair",
    "replacement", "biopsy", "catheter", "implant", "stent",
];

/// Merges the three extraction legs into a `SessionContext` per the
/// rules in spec.md §4.C "Merging". `fallback` marks whether any leg
/// used its documented default.
pub fn merge(
    query: &str,
    general: &GeneralIntentResponse,
    clinical: &ClinicalIntentResponse,
    insights: &InsightsResponse,
    fallback: bool,
) -> SessionContext {
    let intent_terms = merge_intent_terms(clinical, general);
    let anchor_phrases = merge_anchor_phrases(clinical, general);
    let likely_subspecialties = merge_likely_subspecialties(clinical, general);
    let confidence = general.confidence;
    let specificity = general.specificity;
    let is_query_ambiguous = !SessionContext::is_query_clear(confidence, specificity);
    let negative_terms = if is_query_ambiguous {
        Vec::new()
    } else {
        merge_negative_terms(clinical, general)
    };
    let safe_lane_terms = compute_safe_lane_terms(&intent_terms);

    SessionContext {
        q_patient: query.trim().to_string(),
        intent_terms,
        safe_lane_terms,
        anchor_phrases,
        likely_subspecialties,
        negative_terms,
        is_query_ambiguous,
        goal: Some(general.goal.clone()),
        specificity,
        primary_intent: Some(clinical.primary_intent.clone()),
        confidence,
        insights: Insights {
            symptoms: insights.symptoms.clone(),
            preferences: insights.preferences.clone(),
            urgency: insights.urgency,
            specialty: insights.specialty.clone(),
            location: insights.location.clone(),
            summary: insights.summary.clone(),
        },
        fallback,
    }
}

fn normalize(term: &str) -> String {
    term.trim().to_ascii_lowercase()
}

fn merge_intent_terms(
    clinical: &ClinicalIntentResponse,
    general: &GeneralIntentResponse,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut terms = Vec::new();
    for term in clinical.expansion_terms.iter().chain(general.expansion_terms.iter()) {
        let normalized = normalize(term);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            terms.push(normalized);
        }
    }
    terms
}

fn merge_anchor_phrases(
    clinical: &ClinicalIntentResponse,
    general: &GeneralIntentResponse,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut phrases = Vec::new();
    for phrase in clinical.anchor_phrases.iter().chain(general.anchor_phrases.iter()) {
        let normalized = normalize(phrase);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            phrases.push(normalized);
            if phrases.len() >= 5 {
                break;
            }
        }
    }
    phrases
}

fn merge_negative_terms(
    clinical: &ClinicalIntentResponse,
    general: &GeneralIntentResponse,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut terms = Vec::new();
    for term in clinical.negative_terms.iter().chain(general.negative_terms.iter()) {
        let normalized = normalize(term);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            terms.push(normalized);
        }
    }
    terms
}

fn merge_likely_subspecialties(
    clinical: &ClinicalIntentResponse,
    general: &GeneralIntentResponse,
) -> Vec<LikelySubspecialty> {
    let mut by_name: std::collections::HashMap<String, f32> = std::collections::HashMap::new();
    for entry in clinical.likely_subspecialties.iter().chain(general.likely_subspecialties.iter()) {
        let key = normalize(&entry.name);
        by_name
            .entry(key)
            .and_modify(|confidence| *confidence = confidence.max(entry.confidence))
            .or_insert(entry.confidence);
    }

    let mut merged: Vec<LikelySubspecialty> = by_name
        .into_iter()
        .filter(|(_, confidence)| *confidence >= 0.4)
        .map(|(name, confidence)| LikelySubspecialty { name, confidence })
        .collect();
    merged.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(3);
    merged
}

fn compute_safe_lane_terms(intent_terms: &[String]) -> Vec<String> {
    intent_terms
        .iter()
        .filter(|term| {
            let is_symptom_like = SYMPTOM_CONDITION_WHITELIST.iter().any(|w| term.contains(w));
            let is_procedure_like = PROCEDURE_BLACKLIST.iter().any(|w| term.contains(w));
            is_symptom_like && !is_procedure_like
        })
        .take(4)
        .cloned()
        .collect()
}
