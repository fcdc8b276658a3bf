use crate::lexicon::Lexicon;

use super::types::CARDIOLOGY_LANES;

/// Selects which clinical-intent prompt shape to use (spec.md §4.C item 2
/// "a v2 prompt variant injects subspecialty, procedure, and condition
/// lexicons and sets max_tokens ≈320").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClinicalIntentPromptVariant {
    #[default]
    V1,
    V2,
}

pub fn general_intent_system_prompt() -> String {
    "You are a medical intent classifier. Given a patient query and optional \
conversation context, respond with a single JSON object with exactly these \
fields: goal (string), specificity (one of named_procedure, \
confirmed_diagnosis, symptom_only, unspecified), confidence (0.0-1.0), \
expansion_terms (array of strings), negative_terms (array of strings), \
anchor_phrases (array of strings), likely_subspecialties (array of \
{name, confidence}). Respond with raw JSON only, no prose, no markdown \
fences."
        .to_string()
}

/// Builds the clinical-intent system prompt for a specialty, optionally
/// injecting the lexicon-derived subspecialty/procedure/condition lists
/// (variant V2).
pub fn clinical_intent_system_prompt(
    specialty: &str,
    variant: ClinicalIntentPromptVariant,
    lexicon: Option<&Lexicon>,
) -> String {
    let lanes = if specialty.eq_ignore_ascii_case("cardiology") {
        CARDIOLOGY_LANES.join(", ")
    } else {
        format!("general_{}_unclear", specialty.to_ascii_lowercase().replace(' ', "_"))
    };

    let mut prompt = format!(
        "You are a clinical intent classifier for the {specialty} specialty. \
Classify the query's primary_intent into one of these lanes: {lanes}. \
Respond with a single JSON object with fields: primary_intent (string), \
expansion_terms (array of strings), negative_terms (array of strings), \
anchor_phrases (array of strings), likely_subspecialties (array of \
{{name, confidence}}). Respond with raw JSON only, no prose, no markdown \
fences."
    );

    if variant == ClinicalIntentPromptVariant::V2 {
        if let Some(lexicon) = lexicon {
            let subspecialties = lexicon.for_specialty(specialty).join(", ");
            let procedures = lexicon.top_procedures(30).join(", ");
            let conditions = lexicon.top_conditions(30).join(", ");
            prompt.push_str(&format!(
                "\n\nKnown subspecialties: {subspecialties}.\nKnown procedures: \
{procedures}.\nKnown conditions: {conditions}."
            ));
        }
    }

    prompt
}

pub fn insights_system_prompt() -> String {
    "You extract structured insights from a patient's message. Respond with a \
single JSON object with fields: symptoms (array of strings), preferences \
(array of strings), urgency (one of routine, urgent, emergency, or null), \
specialty (string or null), location (string or null), summary (string or \
null). Respond with raw JSON only, no prose, no markdown fences."
        .to_string()
}

/// The shared user message every leg receives (spec.md §4.C: `Query:
/// "..."\nContext: ...last 500 chars of conversation...`).
pub fn shared_user_message(query: &str, conversation: &str) -> String {
    let chars: Vec<char> = conversation.chars().collect();
    let tail_start = chars.len().saturating_sub(500);
    let context_tail: String = chars[tail_start..].iter().collect();
    format!("Query: \"{query}\"\nContext: {context_tail}")
}
