//! Minimal client for an OpenAI-compatible chat completions endpoint.

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AssistantError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.completion_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Sends one completion request and returns the first choice's text.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, AssistantError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "completion request failed");
                AssistantError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "completion service error");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AssistantError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => AssistantError::QuotaExceeded,
                other => AssistantError::Unavailable(format!("completion service returned {other}")),
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                AssistantError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}
