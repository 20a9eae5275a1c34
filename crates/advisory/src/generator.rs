use crate::AdvisoryError;

/// Opaque text generation service.
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt` under the `system` instructions.
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisoryError>;
}

/// Canned generator for tests and offline use.
pub struct MockGenerator {
    response: Option<String>,
}

impl MockGenerator {
    /// Always answers `response`.
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
        }
    }

    /// Always fails as if the service were unreachable.
    pub fn failing() -> Self {
        Self { response: None }
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, AdvisoryError> {
        self.response
            .clone()
            .ok_or_else(|| AdvisoryError::Connection("mock".into()))
    }
}
