use serde::{Deserialize, Serialize};

/// One entry of the medical taxonomy (spec.md §4.L, §6.3): a canonical
/// name, its known aliases, and the exact `filter_values` strings a
/// checklist is allowed to cite verbatim (spec.md §4.K, §8.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub filter_values: Vec<String>,
}

impl TaxonomyEntry {
    /// True if `token` (already lowercased, length ≥2) is a
    /// case-insensitive substring of the canonical name or any alias.
    pub fn matches_token(&self, token: &str) -> bool {
        let canonical = self.canonical_name.to_ascii_lowercase();
        if canonical.contains(token) {
            return true;
        }
        self.aliases
            .iter()
            .any(|alias| alias.to_ascii_lowercase().contains(token))
    }
}
