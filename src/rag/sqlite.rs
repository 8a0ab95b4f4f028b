//! SQLite-backed RAG store implementation.
//!
//! In-process vector store using SQLite for chunk text and
//! brute-force cosine similarity for search.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteRagStore {
    pool: SqlitePool,
}

impl SqliteRagStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.rag_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(ApiError::internal)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                chunk_index INTEGER NOT NULL DEFAULT 0,
                metadata TEXT DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Value>(&metadata_str).ok();
        let chunk_index: i64 = row.get("chunk_index");

        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            chunk_index: chunk_index.max(0) as usize,
            metadata,
        }
    }

    async fn insert_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        chunk: &StoredChunk,
        embedding: &[f32],
    ) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(embedding);
        let metadata_str = match &chunk.metadata {
            Some(m) => serde_json::to_string(m).map_err(ApiError::internal)?,
            None => "{}".to_string(),
        };

        sqlx::query(
            "INSERT OR REPLACE INTO rag_chunks (chunk_id, content, source, chunk_index, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&chunk.chunk_id)
        .bind(&chunk.content)
        .bind(&chunk.source)
        .bind(chunk.chunk_index as i64)
        .bind(&metadata_str)
        .bind(&blob)
        .execute(&mut **tx)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn set_meta_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT OR REPLACE INTO rag_meta (key, value, updated_at)
             VALUES (?1, ?2, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(key)
        .bind(value)
        .execute(&mut **tx)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }
}

#[async_trait]
impl RagStore for SqliteRagStore {
    async fn insert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<(), ApiError> {
        self.insert_batch(vec![(chunk, embedding)]).await
    }

    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        for (chunk, embedding) in &items {
            Self::insert_in_tx(&mut tx, chunk, embedding).await?;
        }
        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, source, chunk_index, metadata, embedding
             FROM rag_chunks",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<ChunkSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Option<Vec<u8>> = row.get("embedding");
                let embedding_bytes = embedding_bytes.filter(|bytes| !bytes.is_empty())?;
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(ChunkSearchResult {
                    chunk: Self::row_to_chunk(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn clear(&self) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM rag_chunks")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    async fn replace_all(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
        meta: &[(&str, &str)],
    ) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM rag_chunks")
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            Self::insert_in_tx(&mut tx, chunk, embedding).await?;
        }
        for (key, value) in meta {
            Self::set_meta_in_tx(&mut tx, key, value).await?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM rag_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        Self::set_meta_in_tx(&mut tx, key, value).await?;
        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteRagStore {
        let tmp = std::env::temp_dir().join(format!(
            "pawmedbot-rag-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        SqliteRagStore::with_path(tmp).await.unwrap()
    }

    fn make_chunk(id: &str, content: &str, source: &str, index: usize) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            chunk_index: index,
            metadata: Some(serde_json::json!({ "start_offset": index * 100 })),
        }
    }

    #[tokio::test]
    async fn insert_and_search() {
        let store = test_store().await;

        let chunk = make_chunk("c1", "Dogs need vaccines", "dogs.txt", 0);
        let embedding = vec![1.0, 0.0, 0.0];

        store.insert(chunk.clone(), embedding.clone()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let results = store.search(&embedding, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk, chunk);
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_truncates() {
        let store = test_store().await;
        store
            .insert_batch(vec![
                (make_chunk("far", "far", "a.txt", 0), vec![0.0, 1.0]),
                (make_chunk("near", "near", "a.txt", 1), vec![1.0, 0.1]),
                (make_chunk("mid", "mid", "b.txt", 0), vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn replace_all_swaps_contents_and_meta() {
        let store = test_store().await;
        store
            .insert(make_chunk("old", "old", "old.txt", 0), vec![1.0])
            .await
            .unwrap();

        store
            .replace_all(
                vec![
                    (make_chunk("n1", "new one", "new.txt", 0), vec![1.0]),
                    (make_chunk("n2", "new two", "new.txt", 1), vec![0.5]),
                ],
                &[("embedding_model", "all-minilm"), ("corpus_fingerprint", "abc")],
            )
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(
            store.get_meta("embedding_model").await.unwrap().as_deref(),
            Some("all-minilm")
        );
        assert_eq!(
            store.get_meta("corpus_fingerprint").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn clear_keeps_meta() {
        let store = test_store().await;
        store
            .insert(make_chunk("c1", "data", "doc", 0), vec![1.0])
            .await
            .unwrap();
        store.set_meta("embedding_model", "embed-v2").await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(
            store.get_meta("embedding_model").await.unwrap().as_deref(),
            Some("embed-v2")
        );
        assert!(store.get_meta("missing").await.unwrap().is_none());
    }

    #[test]
    fn embedding_blob_round_trip() {
        let v = vec![0.25f32, -3.5, 1e-3];
        let bytes = SqliteRagStore::serialize_embedding(&v);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteRagStore::deserialize_embedding(&bytes), v);
    }

    #[test]
    fn cosine_handles_mismatch_and_zero() {
        assert_eq!(SqliteRagStore::cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(SqliteRagStore::cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        let same = SqliteRagStore::cosine_similarity(&[3.0, 4.0], &[3.0, 4.0]);
        assert!((same - 1.0).abs() < 1e-6);
    }
}
