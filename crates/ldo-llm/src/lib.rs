//! LDO Extraction Provider Layer
//!
//! Pluggable implementations of the `ExtractionService` trait from
//! `ldo-domain`. A provider is selected once at startup with
//! [`build_provider`] and shared as an `Arc<dyn ExtractionService>`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing. Selecting it from
//!   configuration requires the `mock-provider` feature.
//! - `OpenAiProvider`: OpenAI-compatible chat completions
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use ldo_llm::MockProvider;
//! use ldo_domain::traits::ExtractionService;
//!
//! let provider = MockProvider::new(r#"[{"name": "Alice"}]"#);
//! let result = tokio_test::block_on(provider.extract("{}", "any chunk")).unwrap();
//! assert_eq!(result, r#"[{"name": "Alice"}]"#);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use ldo_domain::traits::ExtractionService;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

pub use config::{LlmConfig, ProviderKind, Sampling};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during provider calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Shared handle to the selected provider
pub type SharedExtractionService = Arc<dyn ExtractionService<Error = LlmError>>;

/// Build the provider named by the configuration
///
/// `mock` is only selectable when the crate is built with the
/// `mock-provider` feature.
pub fn build_provider(config: &LlmConfig) -> SharedExtractionService {
    info!(provider = ?config.provider, model = %config.model, "Selecting extraction provider");
    match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::from_config(config)),
        ProviderKind::Ollama => Arc::new(OllamaProvider::from_config(config)),
        #[cfg(feature = "mock-provider")]
        ProviderKind::Mock => {
            warn!("Mock provider selected, documents will not reach a model");
            Arc::new(MockProvider::default())
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub(crate) role: &'static str,
    pub(crate) content: &'a str,
}

/// Map a non-success HTTP response to an error
pub(crate) async fn map_status(response: reqwest::Response, model: &str) -> LlmError {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimitExceeded;
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return LlmError::ModelNotAvailable(model.to_string());
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    LlmError::Communication(format!("HTTP {}: {}", status, error_text))
}

#[derive(Debug, Clone)]
enum Script {
    Respond(String),
    FailThenRespond { failures_left: usize, response: String },
    Fail,
    Stall,
}

#[derive(Debug)]
struct MockState {
    default_response: String,
    scripts: Vec<(String, Script)>,
    summary_response: String,
    summaries: Vec<(String, String)>,
    extract_calls: usize,
    summarize_calls: usize,
}

/// Mock provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Scripts are matched by substring against the segment (or document)
/// context, first registered match wins.
///
/// # Examples
///
/// ```
/// use ldo_llm::MockProvider;
/// use ldo_domain::traits::ExtractionService;
///
/// let provider = MockProvider::new("[]");
/// provider.add_response("Order 12", r#"[{"id": 12}]"#);
/// provider.add_transient_failure("flaky", 1, "[]");
///
/// tokio_test::block_on(async {
///     assert_eq!(provider.extract("{}", "Order 12, John").await.unwrap(), r#"[{"id": 12}]"#);
///     assert!(provider.extract("{}", "flaky chunk").await.is_err());
///     assert_eq!(provider.extract("{}", "flaky chunk").await.unwrap(), "[]");
/// });
/// assert_eq!(provider.extract_calls(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a mock returning `response` for every extraction call
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                default_response: response.into(),
                scripts: Vec::new(),
                summary_response: "Mock summary of the document".to_string(),
                summaries: Vec::new(),
                extract_calls: 0,
                summarize_calls: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `response` for contexts containing `pattern`
    pub fn add_response(&self, pattern: impl Into<String>, response: impl Into<String>) {
        self.state()
            .scripts
            .push((pattern.into(), Script::Respond(response.into())));
    }

    /// Fail `failures` times for contexts containing `pattern`, then answer `response`
    pub fn add_transient_failure(
        &self,
        pattern: impl Into<String>,
        failures: usize,
        response: impl Into<String>,
    ) {
        self.state().scripts.push((
            pattern.into(),
            Script::FailThenRespond {
                failures_left: failures,
                response: response.into(),
            },
        ));
    }

    /// Always fail for contexts containing `pattern`
    pub fn add_error(&self, pattern: impl Into<String>) {
        self.state().scripts.push((pattern.into(), Script::Fail));
    }

    /// Never answer for contexts containing `pattern`
    pub fn add_stall(&self, pattern: impl Into<String>) {
        self.state().scripts.push((pattern.into(), Script::Stall));
    }

    /// Set the summary returned when no summary script matches
    pub fn with_summary(self, summary: impl Into<String>) -> Self {
        self.state().summary_response = summary.into();
        self
    }

    /// Answer `summary` for documents containing `pattern`
    pub fn add_summary(&self, pattern: impl Into<String>, summary: impl Into<String>) {
        self.state().summaries.push((pattern.into(), summary.into()));
    }

    /// Number of extraction calls
    pub fn extract_calls(&self) -> usize {
        self.state().extract_calls
    }

    /// Number of summarization calls
    pub fn summarize_calls(&self) -> usize {
        self.state().summarize_calls
    }

    /// Total number of calls
    pub fn call_count(&self) -> usize {
        let state = self.state();
        state.extract_calls + state.summarize_calls
    }

    /// Reset the call counters
    pub fn reset_call_count(&self) {
        let mut state = self.state();
        state.extract_calls = 0;
        state.summarize_calls = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl ExtractionService for MockProvider {
    type Error = LlmError;

    async fn extract(&self, _schema_json: &str, segment_context: &str) -> Result<String, LlmError> {
        let answer = {
            let mut state = self.state();
            state.extract_calls += 1;
            let default_response = state.default_response.clone();

            let script = state
                .scripts
                .iter_mut()
                .find(|(pattern, _)| segment_context.contains(pattern.as_str()))
                .map(|(_, script)| script);

            match script {
                Some(Script::Respond(response)) => Some(Ok(response.clone())),
                Some(Script::FailThenRespond {
                    failures_left,
                    response,
                }) => {
                    if *failures_left > 0 {
                        *failures_left -= 1;
                        Some(Err(LlmError::Communication("Mock transient failure".to_string())))
                    } else {
                        Some(Ok(response.clone()))
                    }
                }
                Some(Script::Fail) => Some(Err(LlmError::Other("Mock error".to_string()))),
                Some(Script::Stall) => None,
                None => Some(Ok(default_response)),
            }
        };

        match answer {
            Some(answer) => answer,
            None => std::future::pending().await,
        }
    }

    async fn summarize(&self, _schema_json: &str, document_context: &str) -> Result<String, LlmError> {
        let mut state = self.state();
        state.summarize_calls += 1;

        let summary = state
            .summaries
            .iter()
            .find(|(pattern, _)| document_context.contains(pattern.as_str()))
            .map(|(_, summary)| summary.clone());
        Ok(summary.unwrap_or_else(|| state.summary_response.clone()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
