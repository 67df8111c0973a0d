use serde::{Deserialize, Serialize};
use std::fmt;

fn default_completion_endpoint() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    300
}

fn default_context_limit() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Settings for the chat-completion service behind the assistant.
#[derive(Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Full URL of the OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_completion_endpoint")]
    pub completion_endpoint: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// How many upcoming reminders are folded into the conversation context.
    #[serde(default = "default_context_limit")]
    pub default_context_limit: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            completion_endpoint: default_completion_endpoint(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            default_context_limit: default_context_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("completion_endpoint", &self.completion_endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("default_context_limit", &self.default_context_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AssistantConfig {
    pub fn new(completion_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            completion_endpoint: completion_endpoint.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty() && !self.completion_endpoint.is_empty()
    }
}
