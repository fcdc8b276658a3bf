//! Test-only fakes shared across components that depend on `LlmClient`
//! (session_context, fit_eval, checklist). Compiled only under `cfg(test)`.

use std::sync::Mutex;

use super::client::{ChatRequest, LlmClient};
use super::error::LlmError;

/// A fake client that returns queued canned responses in order and
/// records every request it received, so callers can assert on prompt
/// content without making network calls.
pub struct FakeLlmClient {
    responses: Mutex<Vec<String>>,
    pub seen: Mutex<Vec<ChatRequest>>,
}

impl FakeLlmClient {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl LlmClient for FakeLlmClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(responses.remove(0))
    }
}

/// A fake client that always errors, for exercising fallback paths.
pub struct FailingLlmClient;

impl LlmClient for FailingLlmClient {
    fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::EmptyCompletion)
    }
}
