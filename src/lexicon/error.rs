#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("missing lexicon file {path}: {source}")]
    MissingFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in lexicon file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
