use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Home page data: index size, whether the local model server answers and
/// which models it has installed.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let indexed_chunks = state.rag_store.count().await?;
    let llm_reachable = state.llm.health_check().await;
    let installed_models = if llm_reachable {
        state.llm.installed_models().await
    } else {
        Vec::new()
    };

    Ok(Json(json!({
        "app": "PawMedBot",
        "indexed_chunks": indexed_chunks,
        "documents_dir": state.indexer.documents_dir().display().to_string(),
        "llm": {
            "provider": state.llm.provider_name(),
            "chat_model": state.llm.chat_model(),
            "embedding_model": state.llm.embedding_model(),
            "reachable": llm_reachable,
            "installed_models": installed_models
        }
    })))
}
