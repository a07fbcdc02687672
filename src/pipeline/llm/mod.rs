pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod parser;
pub mod prompt;

pub use gemini::*;
pub use mock::*;
pub use ollama::*;
pub use parser::*;
pub use prompt::*;

use thiserror::Error;

use crate::config::{LlmConfig, LlmProvider};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Model service is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Model service rejected credentials (status {status})")]
    Auth { status: u16 },

    #[error("API key required for provider {0}")]
    MissingApiKey(String),

    #[error("Model service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

/// External text-generation collaborator (allows mocking).
pub trait LlmClient: Send + Sync {
    /// Single bounded request; no retries at this layer.
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, LlmError>;
}

/// Build the configured client, or `None` when the provider is disabled.
pub fn client_from_config(config: &LlmConfig) -> Result<Option<Box<dyn LlmClient>>, LlmError> {
    let base_url = config.base_url();
    let client: Box<dyn LlmClient> = match config.provider {
        LlmProvider::Disabled => return Ok(None),
        LlmProvider::Ollama => Box::new(OllamaClient::new(&base_url, config.timeout_secs)?),
        LlmProvider::Gemini => {
            let api_key = config
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| LlmError::MissingApiKey(config.provider.to_string()))?;
            Box::new(GeminiClient::new(&base_url, api_key, config.timeout_secs)?)
        }
    };
    Ok(Some(client))
}

/// Map a reqwest transport failure onto the error taxonomy.
fn transport_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(timeout_secs)
    } else if e.is_connect() {
        LlmError::Connection(base_url.to_string())
    } else {
        LlmError::HttpClient(e.to_string())
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn status_error(status: reqwest::StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Auth {
            status: status.as_u16(),
        },
        code => LlmError::Service { status: code, body },
    }
}
