use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{server_unreachable, LlmProvider};
use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// OpenAI-compatible server (LM Studio and friends).
#[derive(Clone)]
pub struct LmStudioProvider {
    base_url: String,
    client: Client,
}

impl LmStudioProvider {
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
struct OpenAiModelsResponse {
    data: Vec<OpenAiModelInfo>,
}

#[derive(Deserialize)]
struct OpenAiModelInfo {
    id: String,
}

fn parse_embeddings(payload: &Value) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::new();
    if let Some(data) = payload["data"].as_array() {
        for item in data {
            if let Some(vals) = item["embedding"].as_array() {
                let vec: Vec<f32> = vals
                    .iter()
                    .filter_map(|v| v.as_f64().map(|f| f as f32))
                    .collect();
                embeddings.push(vec);
            }
        }
    }
    embeddings
}

#[async_trait]
impl LlmProvider for LmStudioProvider {
    fn name(&self) -> &str {
        "lmstudio"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.client.get(&url).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| server_unreachable("LM Studio", e))?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Failed to list models: {}",
                res.status()
            )));
        }

        let response: OpenAiModelsResponse = res.json().await.map_err(ApiError::internal)?;

        Ok(response.data.into_iter().map(|m| m.id).collect())
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| server_unreachable("LM Studio", e))?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("LM Studio chat error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);

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
            .map_err(|e| server_unreachable("LM Studio", e))?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("LM Studio embed error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        let embeddings = parse_embeddings(&payload);
        if embeddings.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "LM Studio returned {} embeddings for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}
