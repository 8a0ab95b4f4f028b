use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_session;
use crate::state::AppState;

pub async fn rebuild_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&headers, &state.sessions).await?;
    tracing::info!("Index rebuild requested by user {}", session.user_id);

    let report = state.indexer.build_index().await?;
    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Indexed {} chunks from {} documents.",
            report.chunks, report.documents
        ),
        "report": report
    })))
}
