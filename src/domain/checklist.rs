use serde::{Deserialize, Serialize};

/// V7's medical-competency checklist (spec.md §3 "Checklist (V7)").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checklist {
    pub filter_values: Vec<String>,
    #[serde(default)]
    pub matched_taxonomy_entries: Vec<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl Checklist {
    pub fn is_empty(&self) -> bool {
        self.filter_values.is_empty()
    }
}
