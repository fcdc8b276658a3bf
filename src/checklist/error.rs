#[derive(Debug, thiserror::Error)]
pub enum ChecklistError {
    #[error("checklist generator llm call failed: {source}")]
    Llm {
        #[source]
        source: crate::llm::LlmError,
    },
    #[error("checklist generator response was not valid json: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}
