use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::core::db::now_timestamp;
use crate::core::errors::ApiError;

/// One stored question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save_chat_history(
        &self,
        user_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<i64, ApiError> {
        let result = sqlx::query(
            "INSERT INTO history (user_id, question, answer, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(question)
        .bind(answer)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(result.last_insert_rowid())
    }

    /// All exchanges for a user, newest first.
    pub async fn load_chat_history(&self, user_id: i64) -> Result<Vec<HistoryEntry>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, question, answer, timestamp FROM history WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        rows.iter().map(row_to_entry).collect()
    }

    /// The last `limit` exchanges in chronological order.
    pub async fn recent_exchanges(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT * FROM (SELECT id, question, answer, timestamp FROM history WHERE user_id = ? ORDER BY id DESC LIMIT ?) ORDER BY id ASC",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        rows.iter().map(row_to_entry).collect()
    }

    pub async fn delete_all(&self, user_id: i64) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected())
    }

    pub async fn count(&self, user_id: i64) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry, ApiError> {
    Ok(HistoryEntry {
        id: row.try_get("id").map_err(ApiError::internal)?,
        question: row.try_get("question").map_err(ApiError::internal)?,
        answer: row.try_get("answer").map_err(ApiError::internal)?,
        timestamp: row.try_get("timestamp").map_err(ApiError::internal)?,
    })
}
