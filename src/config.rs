use serde::{Deserialize, Serialize};

use crate::models::ParseEnumError;
use crate::pipeline::llm::{GEMINI_DEFAULT_URL, OLLAMA_DEFAULT_URL};

/// Application-level constants
pub const APP_NAME: &str = "labwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_PROMPT_TESTS: usize = 50;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "labwise=debug,warn"
    } else {
        "labwise=info,warn"
    }
}

/// Which external model service backs the recommendation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "none")]
    Disabled,
    Ollama,
    Gemini,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "none",
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Disabled => "",
            Self::Ollama => OLLAMA_DEFAULT_URL,
            Self::Gemini => GEMINI_DEFAULT_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Disabled => "",
            Self::Ollama => "medgemma:4b",
            Self::Gemini => "gemini-2.5-flash",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "" => Ok(Self::Disabled),
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            _ => Err(ParseEnumError {
                field: "LlmProvider".into(),
                value: s.into(),
            }),
        }
    }
}

/// External model settings, passed explicitly to the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Upper bound on tests listed in one prompt.
    pub max_prompt_tests: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Disabled,
            base_url: None,
            model: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_prompt_tests: DEFAULT_MAX_PROMPT_TESTS,
        }
    }
}

impl LlmConfig {
    pub fn for_provider(provider: LlmProvider) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(self.provider.default_base_url())
            .to_string()
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.provider.default_model())
    }
}
