#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read corpus file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in corpus file: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("practitioner record `{id}` is invalid: {reason}")]
    InvalidRecord { id: String, reason: String },
    #[error("duplicate practitioner id `{id}` in corpus")]
    DuplicateId { id: String },
}
