use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

const DIMS: usize = 32;

/// In-process provider: word-hash embeddings and a canned chat reply.
pub struct StubProvider {
    reply: String,
    fail_chat: AtomicBool,
    prompts: Mutex<Vec<String>>,
    embed_calls: Mutex<usize>,
}

impl StubProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_chat: AtomicBool::new(false),
            prompts: Mutex::new(Vec::new()),
            embed_calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        let stub = Self::new("");
        stub.fail_chat.store(true, Ordering::SeqCst);
        stub
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock().unwrap()
    }
}

pub fn hash_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMS];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let bucket = word
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % DIMS;
        vector[bucket] += 1.0;
    }
    vector
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec!["phi3:mini".to_string(), "all-minilm".to_string()])
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);

        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(ApiError::Internal("model offline".to_string()));
        }
        Ok(self.reply.clone())
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        *self.embed_calls.lock().unwrap() += 1;
        Ok(inputs.iter().map(|s| hash_embedding(s)).collect())
    }
}
