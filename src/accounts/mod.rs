//! User accounts: signup, login and profile edits.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::core::db::now_timestamp;
use crate::core::errors::ApiError;
use crate::core::security::{hash_password, verify_password};

pub const FILL_ALL_FIELDS: &str = "Please fill all fields.";

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<String, ApiError> {
        if [name, email, password, confirm_password].iter().any(|v| is_blank(v)) {
            return Err(ApiError::bad_request(FILL_ALL_FIELDS));
        }
        if password != confirm_password {
            return Err(ApiError::bad_request("Passwords do not match!"));
        }

        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(ApiError::bad_request("Email already exists. Try logging in."));
        }

        let password_hash = hash_password(password)?;

        let inserted = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(result) => {
                tracing::info!("Created user {}", result.last_insert_rowid());
                Ok("Signup successful! You can now log in.".to_string())
            }
            // Lost a race with a concurrent signup for the same address.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                ApiError::bad_request("Email already exists. Try logging in."),
            ),
            Err(err) => Err(ApiError::internal(err)),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        if is_blank(email) || is_blank(password) {
            return Err(ApiError::bad_request(FILL_ALL_FIELDS));
        }

        let user = self
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| ApiError::Unauthorized("No account found with this email.".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::Unauthorized("Incorrect password.".to_string()));
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, ApiError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn update_user_name(&self, user_id: i64, new_name: &str) -> Result<String, ApiError> {
        if is_blank(new_name) {
            return Err(ApiError::bad_request("Name cannot be empty."));
        }

        let result = sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(new_name.trim())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found.".to_string()));
        }

        Ok("Name updated successfully!".to_string())
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
        confirm_new_password: &str,
    ) -> Result<String, ApiError> {
        if new_password != confirm_new_password {
            return Err(ApiError::bad_request("New passwords do not match!"));
        }
        if is_blank(old_password) || is_blank(new_password) {
            return Err(ApiError::bad_request(FILL_ALL_FIELDS));
        }

        let user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(ApiError::bad_request("Old password is incorrect."));
        }

        let new_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(new_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        tracing::info!("Password changed for user {}", user_id);
        Ok("Password changed successfully!".to_string())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, ApiError> {
    Ok(User {
        id: row.try_get("id").map_err(ApiError::internal)?,
        name: row.try_get("name").map_err(ApiError::internal)?,
        email: row.try_get("email").map_err(ApiError::internal)?,
        password_hash: row.try_get("password_hash").map_err(ApiError::internal)?,
        created_at: row.try_get("created_at").map_err(ApiError::internal)?,
    })
}
