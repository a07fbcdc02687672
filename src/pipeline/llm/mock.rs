use std::sync::Mutex;

use super::{LlmClient, LlmError};

/// Mock LLM client for testing. Returns a fixed reply and records prompts.
pub struct MockLlmClient {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, prompt: &str, _system: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.response.clone())
    }
}

/// Client that always fails with the given error.
pub struct FailingLlmClient {
    error: LlmError,
}

impl FailingLlmClient {
    pub fn new(error: LlmError) -> Self {
        Self { error }
    }

    /// Connection refused at the default local endpoint.
    pub fn unreachable() -> Self {
        Self::new(LlmError::Connection("http://localhost:11434".into()))
    }
}

impl LlmClient for FailingLlmClient {
    fn generate(&self, _model: &str, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_prompts() {
        let mock = MockLlmClient::new("{}");
        assert_eq!(mock.generate("m", "first", "s").unwrap(), "{}");
        mock.generate("m", "second", "s").unwrap();
        assert_eq!(mock.prompts(), vec!["first", "second"]);
    }

    #[test]
    fn failing_client_returns_its_error() {
        let client = FailingLlmClient::new(LlmError::Timeout(5));
        assert_eq!(client.generate("m", "p", "s"), Err(LlmError::Timeout(5)));
    }
}
