#[derive(Debug, thiserror::Error)]
pub enum FitEvalError {
    #[error("fit evaluator llm call failed: {source}")]
    Llm {
        #[source]
        source: crate::llm::LlmError,
    },
    #[error("fit evaluator response was not valid json: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("fit evaluator received an empty candidate batch")]
    EmptyBatch,
}
