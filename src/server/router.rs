use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{auth, chat, health, history, index, profile};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// One route group per page of the app: auth (login / signup), profile,
/// chat and history, plus health/status and an index rebuild hook.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/profile", get(profile::get_profile))
        .route("/api/profile/name", patch(profile::update_name))
        .route("/api/profile/password", post(profile::change_password))
        .route("/api/chat", post(chat::send_message))
        .route(
            "/api/history",
            get(history::list_history).delete(history::delete_history),
        )
        .route("/api/index/rebuild", post(index::rebuild_index))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(configured)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8501".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8501".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_origin_list_falls_back_to_local_defaults() {
        let origins = resolve_allowed_origins(&[" ".to_string()]);
        assert!(origins.contains(&"http://localhost:8501".to_string()));
    }

    #[test]
    fn configured_origins_are_trimmed() {
        let origins = resolve_allowed_origins(&[" https://vet.example ".to_string()]);
        assert_eq!(origins, vec!["https://vet.example".to_string()]);
    }
}
