//! Connection pool and schema for the user/history database.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::core::errors::ApiError;

/// Timestamp format stored in `created_at` / `timestamp` columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub async fn open_pool(db_path: &Path) -> Result<SqlitePool, ApiError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to connect to user db: {}", e)))?;

    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<(), ApiError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to init users table: {}", e)))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to init history table: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_user_id ON history(user_id)")
        .execute(pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let path = std::env::temp_dir().join(format!("pawmedbot-test-{}.db", uuid::Uuid::new_v4()));
    open_pool(&path).await.unwrap()
}
