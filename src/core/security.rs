use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as PasswordHashError, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::errors::ApiError;

const LOGIN_REQUIRED: &str = "Please login first.";

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unusable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("Invalid stored password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(other) => Err(ApiError::Internal(format!(
            "Password verification failed: {}",
            other
        ))),
    }
}

/// The logged-in user a session token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub user_name: String,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

/// In-memory login sessions keyed by opaque bearer tokens.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl_minutes: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes.min(i64::MAX as u64 / 60_000) as i64),
        }
    }

    pub async fn create(&self, user: SessionUser) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let entry = SessionEntry {
            user,
            expires_at: Utc::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| existing.expires_at > Utc::now());
        sessions.insert(token.clone(), entry);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<SessionUser> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.user.clone())
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Keeps the display name of every live session for `user_id` in sync.
    pub async fn rename_user(&self, user_id: i64, new_name: &str) {
        let mut sessions = self.sessions.write().await;
        for entry in sessions.values_mut() {
            if entry.user.user_id == user_id {
                entry.user.user_name = new_name.to_string();
            }
        }
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return None;
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn require_session(
    headers: &HeaderMap,
    sessions: &SessionManager,
) -> Result<SessionUser, ApiError> {
    let token =
        bearer_token(headers).ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string()))?;
    sessions
        .resolve(token)
        .await
        .ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string()))
}
