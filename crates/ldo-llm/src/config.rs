//! Configuration for extraction providers

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which extraction service implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible `/chat/completions` endpoint
    OpenAi,
    /// Local Ollama `/api/chat` endpoint
    Ollama,
    /// Deterministic in-process provider, for offline runs
    #[cfg(feature = "mock-provider")]
    Mock,
}

impl ProviderKind {
    /// Whether the provider talks to a remote endpoint
    pub fn needs_endpoint(self) -> bool {
        match self {
            Self::OpenAi | Self::Ollama => true,
            #[cfg(feature = "mock-provider")]
            Self::Mock => false,
        }
    }
}

/// Sampling parameters of one call type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling mass
    pub top_p: f32,
}

impl Sampling {
    fn validate(&self, label: &str) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("{} temperature must be between 0.0 and 2.0", label));
        }
        if !(0.0..=1.0).contains(&self.top_p) || self.top_p == 0.0 {
            return Err(format!("{} top_p must be in (0.0, 1.0]", label));
        }
        Ok(())
    }
}

/// Provider settings, the `[llm]` section of the configuration file
///
/// # Examples
///
/// ```
/// use ldo_llm::{LlmConfig, ProviderKind};
///
/// let config = LlmConfig::default();
/// assert_eq!(config.provider, ProviderKind::OpenAi);
/// assert_eq!(config.extraction_sampling.temperature, 0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider implementation
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Service base URL (`https://api.openai.com/v1`, `http://localhost:11434`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key; the CLI fills it from `LDO_API_KEY` when absent
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for segment extraction
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for summarization, defaults to `model`
    #[serde(default)]
    pub summary_model: Option<String>,

    /// Timeout of a single HTTP request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling for extraction calls
    #[serde(default = "default_extraction_sampling")]
    pub extraction_sampling: Sampling,

    /// Sampling for summarization calls
    #[serde(default = "default_summary_sampling")]
    pub summary_sampling: Sampling,
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_extraction_sampling() -> Sampling {
    Sampling {
        temperature: 0.2,
        top_p: 0.8,
    }
}

fn default_summary_sampling() -> Sampling {
    Sampling {
        temperature: 0.5,
        top_p: 0.9,
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            summary_model: None,
            request_timeout_secs: default_request_timeout_secs(),
            extraction_sampling: default_extraction_sampling(),
            summary_sampling: default_summary_sampling(),
        }
    }
}

impl LlmConfig {
    /// Deterministic offline configuration
    #[cfg(feature = "mock-provider")]
    pub fn mock() -> Self {
        Self {
            provider: ProviderKind::Mock,
            ..Self::default()
        }
    }

    /// Local Ollama configuration
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Ollama,
            base_url: crate::ollama::DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Model for summarization calls
    pub fn summary_model(&self) -> &str {
        self.summary_model.as_deref().unwrap_or(&self.model)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.provider.needs_endpoint() {
            if self.base_url.trim().is_empty() {
                return Err("llm.base_url must not be empty".to_string());
            }
            if self.model.trim().is_empty() {
                return Err("llm.model must not be empty".to_string());
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("llm.request_timeout_secs must be greater than 0".to_string());
        }
        self.extraction_sampling.validate("extraction")?;
        self.summary_sampling.validate("summary")?;
        Ok(())
    }
}
