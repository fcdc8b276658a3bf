#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("SERVER_PORT is not a valid port number: {0}")]
    InvalidServerPort(String),
    #[error("WORKERS is not a valid positive integer: {0}")]
    InvalidWorkers(String),
}
