use serde::{Deserialize, Serialize};

use crate::core::config::LlmConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Fills sampling parameters the caller left unset from the `llm` config section.
    pub fn with_config(mut self, config: &LlmConfig) -> Self {
        self.temperature = self.temperature.or(config.temperature);
        self.max_tokens = self.max_tokens.or(config.max_tokens);
        self
    }
}
