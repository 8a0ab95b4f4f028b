use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_session;
use crate::state::AppState;

/// Newest first.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    let history = state.history.load_chat_history(session.user_id).await?;
    Ok(Json(json!({ "history": history })))
}

pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    let deleted = state.history.delete_all(session.user_id).await?;
    tracing::info!("Deleted {} history rows for user {}", deleted, session.user_id);

    Ok(Json(json!({
        "success": true,
        "message": "All history deleted!",
        "deleted": deleted
    })))
}
