use serde::{Deserialize, Serialize};

/// Structured view of a practitioner's `clinical_expertise` field
/// (spec.md §4.T "Structured expertise parsing"). Parsing never fails:
/// if no segment carries a recognized prefix, the raw string is kept as
/// a lower-weight fallback field so unstructured sources stay
/// searchable (spec.md §3 invariant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedExpertise {
    pub procedures: Vec<String>,
    pub conditions: Vec<String>,
    pub interests: Vec<String>,
    pub raw_fallback: Option<String>,
}

impl ParsedExpertise {
    /// Text handed to the BM25 `clinical_expertise` field: structured
    /// segments first, then the raw fallback if nothing structured was
    /// found (so a purely unstructured source like `"Diabetes, IBS,
    /// Obesity"` still contributes to that field — spec.md §8 boundary
    /// behavior).
    pub fn searchable_text(&self) -> String {
        if self.procedures.is_empty() && self.conditions.is_empty() && self.interests.is_empty() {
            return self.raw_fallback.clone().unwrap_or_default();
        }
        let mut parts = Vec::new();
        parts.extend(self.procedures.iter().cloned());
        parts.extend(self.conditions.iter().cloned());
        parts.extend(self.interests.iter().cloned());
        parts.join(" ")
    }
}

const PROCEDURE_PREFIX: &str = "procedure:";
const CONDITION_PREFIX: &str = "condition:";
const INTERESTS_PREFIX: &str = "clinical interests:";

/// Parses a semicolon-delimited `clinical_expertise` string into its
/// structured segments. Segment matching is case-insensitive on the
/// prefix; the original casing of the value is preserved.
pub fn parse(raw: &str) -> ParsedExpertise {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedExpertise::default();
    }

    let mut result = ParsedExpertise::default();
    let mut any_structured = false;

    for segment in trimmed.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let lower = segment.to_ascii_lowercase();
        if let Some(value) = lower
            .strip_prefix(PROCEDURE_PREFIX)
            .map(|_| segment[PROCEDURE_PREFIX.len()..].trim().to_string())
        {
            if !value.is_empty() {
                result.procedures.push(value);
                any_structured = true;
            }
            continue;
        }
        if let Some(value) = lower
            .strip_prefix(CONDITION_PREFIX)
            .map(|_| segment[CONDITION_PREFIX.len()..].trim().to_string())
        {
            if !value.is_empty() {
                result.conditions.push(value);
                any_structured = true;
            }
            continue;
        }
        if let Some(value) = lower
            .strip_prefix(INTERESTS_PREFIX)
            .map(|_| segment[INTERESTS_PREFIX.len()..].trim().to_string())
        {
            if !value.is_empty() {
                result.interests.push(value);
                any_structured = true;
            }
            continue;
        }
    }

    if !any_structured {
        result.raw_fallback = Some(trimmed.to_string());
    }
    result
}
