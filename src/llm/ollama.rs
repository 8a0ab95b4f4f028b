use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::provider::{server_unreachable, LlmProvider};
use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelInfo>,
}

#[derive(Deserialize)]
struct OllamaModelInfo {
    name: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Maps request sampling parameters onto Ollama's `options` object.
fn build_options(request: &ChatRequest) -> Map<String, Value> {
    let mut options = Map::new();
    if let Some(t) = request.temperature {
        options.insert("temperature".to_string(), json!(t));
    }
    if let Some(n) = request.max_tokens {
        options.insert("num_predict".to_string(), json!(n));
    }
    options
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| server_unreachable("Ollama", e))?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Failed to list models: {}",
                res.status()
            )));
        }

        let tags: OllamaTagsResponse = res.json().await.map_err(ApiError::internal)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });
        let options = build_options(&request);
        if !options.is_empty() {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("options".to_string(), Value::Object(options));
            }
        }

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| server_unreachable("Ollama", e))?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Ollama chat error: {}", text)));
        }

        let payload: OllamaChatResponse = res.json().await.map_err(ApiError::internal)?;
        Ok(payload.message.content)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| server_unreachable("Ollama", e))?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Ollama embed error: {}", text)));
        }

        let payload: OllamaEmbedResponse = res.json().await.map_err(ApiError::internal)?;
        if payload.embeddings.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Ollama returned {} embeddings for {} inputs",
                payload.embeddings.len(),
                inputs.len()
            )));
        }

        Ok(payload.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn options_only_carry_set_parameters() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        assert!(build_options(&request).is_empty());

        let mut request = request;
        request.temperature = Some(0.2);
        request.max_tokens = Some(256);
        let options = build_options(&request);
        assert_eq!(options.get("temperature"), Some(&json!(0.2)));
        assert_eq!(options.get("num_predict"), Some(&json!(256)));
    }

    #[test]
    fn base_url_is_normalized() {
        let provider =
            OllamaProvider::new("http://localhost:11434/".to_string(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn unreachable_server_is_unhealthy() {
        let provider =
            OllamaProvider::new("http://127.0.0.1:9".to_string(), Duration::from_secs(1)).unwrap();
        assert!(!provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_server_is_service_unavailable() {
        let provider =
            OllamaProvider::new("http://127.0.0.1:9".to_string(), Duration::from_secs(1)).unwrap();

        let err = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]), "phi3:mini")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
        assert!(err.user_message().starts_with("Ollama is not reachable"));

        let err = provider.list_models().await.unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    #[ignore]
    async fn live_ollama_chat_and_embed() {
        let provider = OllamaProvider::new(
            "http://localhost:11434".to_string(),
            Duration::from_secs(120),
        )
        .unwrap();

        let reply = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("Say hello")]), "phi3:mini")
            .await
            .unwrap();
        assert!(!reply.is_empty());

        let vectors = provider
            .embed(&["dog".to_string(), "cat".to_string()], "all-minilm")
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
    }
}
