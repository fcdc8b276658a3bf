use serde::de::DeserializeOwned;

use super::error::LlmError;

/// Strips a leading ` ```json? ` fence and trailing ` ``` ` before
/// parsing, mirroring the teacher's defensive markdown-fence handling
/// for model output that should be raw JSON but sometimes isn't.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_leading = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .trim_start();
    without_leading
        .strip_suffix("```")
        .unwrap_or(without_leading)
        .trim()
}

/// Parses a model completion as JSON after stripping a possible code
/// fence, surfacing the raw parse error with the fence-stripped text
/// the caller attempted to decode.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|source| LlmError::InvalidJson { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        goal: String,
    }

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"goal\": \"diagnostic_workup\"}\n```";
        assert_eq!(strip_code_fence(raw), "{\"goal\": \"diagnostic_workup\"}");
    }

    #[test]
    fn strips_bare_fence_without_language_tag() {
        let raw = "```\n{\"goal\": \"diagnostic_workup\"}\n```";
        assert_eq!(strip_code_fence(raw), "{\"goal\": \"diagnostic_workup\"}");
    }

    #[test]
    fn parses_fenced_json_into_target_type() {
        let raw = "```json\n{\"goal\": \"diagnostic_workup\"}\n```";
        let parsed: Sample = parse_json(raw).expect("parse");
        assert_eq!(parsed.goal, "diagnostic_workup");
    }

    #[test]
    fn passes_through_unfenced_json() {
        let raw = "{\"goal\": \"diagnostic_workup\"}";
        let parsed: Sample = parse_json(raw).expect("parse");
        assert_eq!(parsed.goal, "diagnostic_workup");
    }
}
