use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::core::security::require_session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: String,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    let Json(payload) = payload?;
    let reply = state
        .chat
        .handle_message(session.user_id, &payload.message)
        .await?;
    Ok(Json(reply))
}
