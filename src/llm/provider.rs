use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama", "lmstudio")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// names of the models installed on the provider
    async fn list_models(&self) -> Result<Vec<String>, ApiError>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError>;

    /// generate embeddings, one vector per input in input order
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// A request that never got an HTTP response: the model server is down or refusing connections.
pub(crate) fn server_unreachable(provider: &str, err: reqwest::Error) -> ApiError {
    ApiError::ServiceUnavailable(format!("{} is not reachable: {}", provider, err))
}
