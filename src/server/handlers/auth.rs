use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::{bearer_token, require_session, SessionUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let message = state
        .accounts
        .signup(
            &payload.name,
            &payload.email,
            &payload.password,
            &payload.confirm_password,
        )
        .await?;

    Ok(Json(json!({"success": true, "message": message})))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let user = state.accounts.login(&payload.email, &payload.password).await?;

    let token = state
        .sessions
        .create(SessionUser {
            user_id: user.id,
            user_name: user.name.clone(),
        })
        .await;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Login successful!",
        "token": token,
        "user": user
    })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token).await;
    }
    tracing::info!("User {} logged out", session.user_id);

    Ok(Json(json!({
        "success": true,
        "message": format!("Goodbye, {}!", session.user_name)
    })))
}
