pub mod error;

pub use error::ChecklistError;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::{Checklist, RankingConfig};
use crate::lexicon::{Lexicon, TaxonomyEntry};
use crate::llm::{ChatRequest, LlmClient};
use crate::text::tokenize::tokenize_min2;

const SYSTEM_PROMPT: &str = "You are a medical-competency checklist generator. Given a \
patient query and a list of matched taxonomy entries (each with a canonical name and a \
set of exact filter-value strings), select the filter values most relevant to the \
query. You MUST only return strings taken verbatim from the filter values you were \
given — never paraphrase, rename, or invent a new value. Respond with a single JSON \
object: {\"filter_values\": [string, ...], \"reasoning\": string}. Respond with raw \
JSON only, no prose, no markdown fences.";

#[derive(Debug, Deserialize)]
struct ChecklistResponse {
    #[serde(default)]
    filter_values: Vec<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Builds a V7 medical-competency checklist from the query (spec.md
/// §4.K). Returns an empty checklist when no taxonomy entry matches —
/// this is a normal outcome, not an error.
pub fn generate(
    query: &str,
    lexicon: &Lexicon,
    llm_client: &dyn LlmClient,
    config: &RankingConfig,
    model: &str,
) -> Result<Checklist, ChecklistError> {
    let matched = lexicon.find_relevant_taxonomy_entries(query);
    if matched.is_empty() {
        return Ok(Checklist::default());
    }

    let matched_names: Vec<String> = matched.iter().map(|e| e.canonical_name.clone()).collect();
    let user_message = render_user_message(query, &matched);

    let request = ChatRequest {
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_message,
        model: model.to_string(),
        max_tokens: 400,
        temperature: 0.0,
        timeout: Duration::from_secs(20),
    };

    let raw = llm_client
        .complete(&request)
        .map_err(|source| ChecklistError::Llm { source })?;
    let parsed: ChecklistResponse = crate::llm::parse_json(&raw)
        .map_err(|err| match err {
            crate::llm::LlmError::InvalidJson { source } => ChecklistError::InvalidJson { source },
            other => ChecklistError::Llm { source: other },
        })?;

    let allowed: std::collections::HashSet<&str> = matched
        .iter()
        .flat_map(|entry| entry.filter_values.iter().map(String::as_str))
        .collect();

    let mut filter_values: Vec<String> = parsed
        .filter_values
        .into_iter()
        .filter(|value| allowed.contains(value.as_str()))
        .collect();
    filter_values.dedup();
    filter_values.truncate(config.max_filter_values);

    Ok(Checklist {
        filter_values,
        matched_taxonomy_entries: matched_names,
        reasoning: parsed.reasoning,
    })
}

/// True if the query contains at least one token (length ≥2) that
/// substring-matches a taxonomy entry (spec.md §4.K step 1).
pub fn has_relevant_entries(query: &str, lexicon: &Lexicon) -> bool {
    !tokenize_min2(query).is_empty() && !lexicon.find_relevant_taxonomy_entries(query).is_empty()
}

fn render_user_message(query: &str, matched: &[&TaxonomyEntry]) -> String {
    let rendered = matched
        .iter()
        .map(|entry| {
            let mut values = entry.filter_values.clone();
            values.truncate(30);
            format!("{}: {}", entry.canonical_name, values.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Query: \"{query}\"\n\nMatched taxonomy entries:\n{rendered}")
}
