#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {source}")]
    Transport {
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("llm response body could not be read: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("llm response was not valid json: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("llm response had no completion choices")]
    EmptyCompletion,
    #[error("llm response content failed shape validation: {reason}")]
    ShapeMismatch { reason: String },
    #[error("llm call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl From<ureq::Error> for LlmError {
    fn from(source: ureq::Error) -> Self {
        LlmError::Transport {
            source: Box::new(source),
        }
    }
}

impl From<std::io::Error> for LlmError {
    fn from(source: std::io::Error) -> Self {
        LlmError::Io { source }
    }
}
