//! RagStore trait: storage interface for the document index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored document chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source document file name.
    pub source: String,
    /// Position of the chunk within its source.
    pub chunk_index: usize,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Similarity score (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait RagStore: Send + Sync {
    /// Insert a chunk with its embedding vector.
    async fn insert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<(), ApiError>;

    /// Insert multiple chunks in one transaction.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError>;

    /// Top `limit` chunks by cosine similarity, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    /// Remove every chunk. Metadata is kept.
    async fn clear(&self) -> Result<(), ApiError>;

    /// Swap the whole index for `items` and record `meta` atomically.
    async fn replace_all(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
        meta: &[(&str, &str)],
    ) -> Result<(), ApiError>;

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError>;
}
