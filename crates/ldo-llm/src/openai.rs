//! OpenAI-compatible chat completions provider
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, Azure-style gateways, vLLM, LM Studio...).

use crate::config::{LlmConfig, Sampling};
use crate::prompt::{
    extraction_prompt, summary_prompt, EXTRACTION_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use crate::{map_status, ChatMessage, LlmError};
use async_trait::async_trait;
use ldo_domain::traits::ExtractionService;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Chat completions provider
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    summary_model: String,
    extraction_sampling: Sampling,
    summary_sampling: Sampling,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider from the `[llm]` configuration section
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
            summary_model: config.summary_model().to_string(),
            extraction_sampling: config.extraction_sampling,
            summary_sampling: config.summary_sampling,
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        sampling: Sampling,
    ) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(map_status(response, model).await);
        }

        let parsed = response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))?;

        debug!(model, chars = content.len(), "Completion received");
        Ok(content)
    }
}

#[async_trait]
impl ExtractionService for OpenAiProvider {
    type Error = LlmError;

    async fn extract(&self, schema_json: &str, segment_context: &str) -> Result<String, LlmError> {
        let prompt = extraction_prompt(schema_json, segment_context);
        self.complete(&self.model, EXTRACTION_SYSTEM_PROMPT, &prompt, self.extraction_sampling)
            .await
    }

    async fn summarize(&self, schema_json: &str, document_context: &str) -> Result<String, LlmError> {
        let prompt = summary_prompt(schema_json, document_context);
        self.complete(&self.summary_model, SUMMARY_SYSTEM_PROMPT, &prompt, self.summary_sampling)
            .await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
