use std::sync::Arc;

use crate::core::config::LlmConfig;
use crate::llm::testing::StubProvider;
use crate::llm::LlmService;

#[test]
fn unknown_provider_is_rejected() {
    let config = LlmConfig {
        provider: "openai".to_string(),
        ..LlmConfig::default()
    };
    let err = LlmService::from_config(&config).err().unwrap();
    assert!(err.to_string().contains("Unsupported LLM provider"));
}

#[test]
fn builds_both_local_providers() {
    let ollama = LlmService::from_config(&LlmConfig::default()).unwrap();
    assert_eq!(ollama.provider_name(), "ollama");
    assert_eq!(ollama.chat_model(), "phi3:mini");

    let lmstudio = LlmService::from_config(&LlmConfig {
        provider: "lmstudio".to_string(),
        base_url: "http://localhost:1234".to_string(),
        ..LlmConfig::default()
    })
    .unwrap();
    assert_eq!(lmstudio.provider_name(), "lmstudio");
}

#[tokio::test]
async fn complete_trims_reply_and_sends_prompt() {
    let stub = Arc::new(StubProvider::new("  Keep the dog hydrated.\n"));
    let service = LlmService::with_provider(stub.clone(), LlmConfig::default());

    let reply = service.complete("Question: dog vomiting").await.unwrap();
    assert_eq!(reply, "Keep the dog hydrated.");
    assert_eq!(stub.prompts(), vec!["Question: dog vomiting".to_string()]);
}

#[tokio::test]
async fn embed_query_returns_single_vector() {
    let stub = Arc::new(StubProvider::new("ok"));
    let service = LlmService::with_provider(stub, LlmConfig::default());

    let vector = service.embed_query("cat fever").await.unwrap();
    assert_eq!(vector.len(), 32);
    assert!(vector.iter().any(|v| *v > 0.0));
    assert!(service.health_check().await);
}

#[tokio::test]
async fn installed_models_come_from_the_provider() {
    let service = LlmService::with_provider(Arc::new(StubProvider::new("ok")), LlmConfig::default());
    assert_eq!(
        service.installed_models().await,
        vec!["phi3:mini".to_string(), "all-minilm".to_string()]
    );
}
