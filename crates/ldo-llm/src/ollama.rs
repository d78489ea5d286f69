//! Ollama Provider Implementation
//!
//! Talks to a local Ollama instance through its `/api/chat` endpoint.
//! Retries are not done here: the extractor wraps every call in its own
//! rate-limited retry loop.
//!
//! # Examples
//!
//! ```no_run
//! use ldo_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3");
//! ```

use crate::config::{LlmConfig, Sampling};
use crate::prompt::{
    extraction_prompt, summary_prompt, EXTRACTION_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use crate::{map_status, ChatMessage, LlmError};
use async_trait::async_trait;
use ldo_domain::traits::ExtractionService;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    summary_model: String,
    extraction_sampling: Sampling,
    summary_sampling: Sampling,
    client: reqwest::Client,
}

/// Request body for the Ollama chat API
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
}

/// Response from the Ollama chat API
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[allow(dead_code)]
    done: bool,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use for both call types (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let defaults = LlmConfig::default();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            summary_model: model.clone(),
            model,
            extraction_sampling: defaults.extraction_sampling,
            summary_sampling: defaults.summary_sampling,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Create a provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Create a provider from the `[llm]` configuration section
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            endpoint: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            summary_model: config.summary_model().to_string(),
            extraction_sampling: config.extraction_sampling,
            summary_sampling: config.summary_sampling,
            client: build_client(config.request_timeout()),
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Send one chat request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails
    /// - Response format is invalid
    pub async fn chat(
        &self,
        model: &str,
        system: &str,
        user: &str,
        sampling: Sampling,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);

        let request_body = OllamaChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(map_status(response, model).await);
        }

        let body = response
            .json::<OllamaChatResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        debug!(model, chars = body.message.content.len(), "Ollama response received");
        Ok(body.message.content)
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl ExtractionService for OllamaProvider {
    type Error = LlmError;

    async fn extract(&self, schema_json: &str, segment_context: &str) -> Result<String, LlmError> {
        let prompt = extraction_prompt(schema_json, segment_context);
        self.chat(&self.model, EXTRACTION_SYSTEM_PROMPT, &prompt, self.extraction_sampling)
            .await
    }

    async fn summarize(&self, schema_json: &str, document_context: &str) -> Result<String, LlmError> {
        let prompt = summary_prompt(schema_json, document_context);
        self.chat(&self.summary_model, SUMMARY_SYSTEM_PROMPT, &prompt, self.summary_sampling)
            .await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model, "llama3");
        assert_eq!(provider.summary_model, "llama3");
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model, "mistral");
    }

    #[test]
    fn test_ollama_provider_from_config() {
        let mut config = LlmConfig::ollama("llama3");
        config.summary_model = Some("llama3:70b".into());
        let provider = OllamaProvider::from_config(&config);
        assert_eq!(provider.summary_model, "llama3:70b");
        assert_eq!(provider.extraction_sampling.temperature, 0.2);
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_request_body_shape() {
        let body = OllamaChatRequest {
            model: "llama3",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            stream: false,
            options: OllamaOptions {
                temperature: 0.5,
                top_p: 0.9,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["options"]["temperature"], 0.5);
    }

    // Integration tests (requires running Ollama)
    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_extract_integration() {
        let provider = OllamaProvider::default_endpoint("llama3");
        let result = provider
            .extract(r#"{"name":"people","columns":[{"name":"name","type":"TEXT"}]}"#, "Alice and Bob")
            .await;

        if let Ok(response) = result {
            assert!(!response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Use invalid endpoint to trigger error
        let provider = OllamaProvider::new("http://localhost:99999", "llama3");

        let result = provider.extract("{}", "test").await;
        assert!(result.is_err());

        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            _ => panic!("Expected Communication error"),
        }
    }
}
