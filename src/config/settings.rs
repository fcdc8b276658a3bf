use super::ConfigError;

/// Default worker concurrency when `WORKERS` is unset, mirroring the
/// teacher's fixed `QUEUE_MAX_CONCURRENCY` default (spec.md §6.4).
const DEFAULT_WORKERS: usize = 4;

/// Process-wide settings read once from the environment at startup
/// (spec.md §6.4). `api_key` is required only once an LLM-calling path
/// is actually invoked — a pure-BM25 v2 run with no fit evaluation
/// never needs it, so `from_env` does not fail eagerly on a missing key.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub server_port: Option<u16>,
    pub workers: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.trim().is_empty());

        let server_port = match std::env::var("SERVER_PORT") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidServerPort(raw))?,
            ),
            Err(_) => None,
        };

        let workers = match std::env::var("WORKERS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| ConfigError::InvalidWorkers(raw.clone()))?,
            Err(_) => DEFAULT_WORKERS,
        };

        Ok(Self {
            api_key,
            server_port,
            workers,
        })
    }

    /// Returns the API key or a `MissingApiKey` error, for callers on a
    /// path that is about to make an LLM call (spec.md §6.4).
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("WORKERS");
    }

    #[test]
    fn missing_api_key_is_not_fatal_until_required() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let settings = Settings::from_env().expect("from_env");
        assert!(settings.api_key.is_none());
        assert_eq!(settings.workers, DEFAULT_WORKERS);
        assert!(matches!(settings.require_api_key(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn invalid_server_port_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("SERVER_PORT", "not-a-port");
        let err = Settings::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServerPort(_)));
        std::env::remove_var("SERVER_PORT");
    }

    #[test]
    fn workers_overrides_default_when_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("WORKERS", "8");
        let settings = Settings::from_env().expect("from_env");
        assert_eq!(settings.workers, 8);
        std::env::remove_var("WORKERS");
    }
}
