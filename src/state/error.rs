use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to open user database: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Failed to initialize RAG store: {0}")]
    Rag(#[source] anyhow::Error),

    #[error("Failed to initialize LLM service: {0}")]
    Llm(#[source] anyhow::Error),
}
