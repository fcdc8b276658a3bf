use thiserror::Error;

/// Errors `pipeline::rank` can return. Everything else (a single LLM
/// leg timing out, an evaluator call failing) is recovered locally by
/// the component that owns it and never reaches this boundary — per
/// spec.md §7, a request only fails here on a validation error, an
/// empty corpus, or a checklist/session-context path that could not
/// even produce its documented fallback.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("shortlistSize must be greater than zero")]
    InvalidShortlistSize,
    #[error("checklist generation failed: {source}")]
    Checklist {
        #[source]
        source: crate::checklist::ChecklistError,
    },
}
