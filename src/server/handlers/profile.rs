use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_new_password: String,
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    let user = state
        .accounts
        .get_user_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(Json(json!({ "user": user })))
}

pub async fn update_name(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UpdateNameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    let Json(payload) = payload?;
    let message = state
        .accounts
        .update_user_name(session.user_id, &payload.name)
        .await?;
    state
        .sessions
        .rename_user(session.user_id, payload.name.trim())
        .await;

    Ok(Json(json!({"success": true, "message": message})))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    let Json(payload) = payload?;
    let message = state
        .accounts
        .change_password(
            session.user_id,
            &payload.old_password,
            &payload.new_password,
            &payload.confirm_new_password,
        )
        .await?;

    Ok(Json(json!({"success": true, "message": message})))
}
