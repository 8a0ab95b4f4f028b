use std::sync::Arc;
use std::time::Duration;

use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;
use crate::llm::lmstudio::LmStudioProvider;
use crate::llm::ollama::OllamaProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{ChatMessage, ChatRequest};

/// Binds a provider to the configured chat and embedding models.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl LlmService {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let provider: Arc<dyn LlmProvider> = match config.provider.as_str() {
            "ollama" => Arc::new(OllamaProvider::new(config.base_url.clone(), timeout)?),
            "lmstudio" => Arc::new(LmStudioProvider::new(config.base_url.clone(), timeout)?),
            other => {
                return Err(ApiError::BadRequest(format!(
                    "Unsupported LLM provider: {}",
                    other
                )))
            }
        };

        tracing::info!(
            provider = provider.name(),
            chat_model = %config.chat_model,
            embedding_model = %config.embedding_model,
            "LLM provider configured"
        );

        Ok(Self::with_provider(provider, config.clone()))
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>, config: LlmConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }

    /// Single-turn completion for an already rendered prompt.
    pub async fn complete(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_config(&self.config);
        self.chat(request).await
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let reply = self.provider.chat(request, &self.config.chat_model).await?;
        Ok(reply.trim().to_string())
    }

    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.provider
            .embed(inputs, &self.config.embedding_model)
            .await
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("Embedding provider returned no vector".to_string()))
    }

    /// Installed model names, or an empty list when the server cannot say.
    pub async fn installed_models(&self) -> Vec<String> {
        match self.provider.list_models().await {
            Ok(models) => models,
            Err(err) => {
                tracing::warn!("Listing models failed: {}", err);
                Vec::new()
            }
        }
    }

    pub async fn health_check(&self) -> bool {
        match self.provider.health_check().await {
            Ok(healthy) => healthy,
            Err(err) => {
                tracing::warn!("LLM health check failed: {}", err);
                false
            }
        }
    }
}
