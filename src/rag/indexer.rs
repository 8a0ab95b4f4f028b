//! Builds and refreshes the document index.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::loader::{corpus_fingerprint, load_documents, LoadedDocument};
use super::splitter::{RecursiveSplitter, SplitterConfig, TextChunk};
use super::store::{RagStore, StoredChunk};
use crate::core::config::RagConfig;
use crate::core::errors::ApiError;
use crate::llm::LlmService;

pub const META_EMBEDDING_MODEL: &str = "embedding_model";
pub const META_CORPUS_FINGERPRINT: &str = "corpus_fingerprint";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
    /// False when an up-to-date index was reused.
    pub rebuilt: bool,
}

pub struct RagIndexer {
    store: Arc<dyn RagStore>,
    llm: LlmService,
    documents_dir: PathBuf,
    splitter: SplitterConfig,
    batch_size: usize,
    rebuild_lock: Mutex<()>,
}

fn into_stored(chunk: TextChunk) -> StoredChunk {
    StoredChunk {
        chunk_id: format!("{}#{}", chunk.source, chunk.chunk_index),
        metadata: Some(serde_json::json!({ "start_offset": chunk.start_offset })),
        content: chunk.text,
        source: chunk.source,
        chunk_index: chunk.chunk_index,
    }
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(ApiError::internal)?
}

impl RagIndexer {
    pub fn new(
        store: Arc<dyn RagStore>,
        llm: LlmService,
        documents_dir: PathBuf,
        config: &RagConfig,
    ) -> Self {
        Self {
            store,
            llm,
            documents_dir,
            splitter: SplitterConfig::from(config),
            batch_size: config.embed_batch_size.max(1),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn documents_dir(&self) -> &PathBuf {
        &self.documents_dir
    }

    /// Reuses the stored index unless it is empty or was built from a
    /// different embedding model or document set.
    pub async fn ensure_index(&self) -> Result<IndexReport, ApiError> {
        let _guard = self.rebuild_lock.lock().await;

        let fingerprint = self.fingerprint().await?;
        let count = self.store.count().await?;
        let stored_model = self.store.get_meta(META_EMBEDDING_MODEL).await?;
        let stored_fingerprint = self.store.get_meta(META_CORPUS_FINGERPRINT).await?;

        let stale_reason = if count == 0 {
            Some("index is empty")
        } else if stored_model.as_deref() != Some(self.llm.embedding_model()) {
            Some("embedding model changed")
        } else if stored_fingerprint.as_deref() != Some(fingerprint.as_str()) {
            Some("documents changed")
        } else {
            None
        };

        match stale_reason {
            Some(reason) => {
                tracing::info!("Rebuilding document index: {}", reason);
                self.build_locked(fingerprint).await
            }
            None => {
                tracing::info!("Reusing document index with {} chunks", count);
                Ok(IndexReport {
                    documents: 0,
                    chunks: count,
                    rebuilt: false,
                })
            }
        }
    }

    /// Unconditional rebuild from the documents directory.
    pub async fn build_index(&self) -> Result<IndexReport, ApiError> {
        let _guard = self.rebuild_lock.lock().await;
        let fingerprint = self.fingerprint().await?;
        self.build_locked(fingerprint).await
    }

    async fn fingerprint(&self) -> Result<String, ApiError> {
        let dir = self.documents_dir.clone();
        blocking(move || corpus_fingerprint(&dir)).await
    }

    async fn build_locked(&self, fingerprint: String) -> Result<IndexReport, ApiError> {
        let dir = self.documents_dir.clone();
        let documents: Vec<LoadedDocument> = blocking(move || load_documents(&dir)).await?;

        if documents.is_empty() {
            tracing::warn!("No documents found in {}", self.documents_dir.display());
        }

        let splitter = RecursiveSplitter::new(self.splitter.clone());
        let chunks: Vec<TextChunk> = documents
            .iter()
            .flat_map(|doc| splitter.split_document(&doc.content, &doc.source))
            .collect();
        tracing::info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let mut items = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.llm.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(ApiError::Internal(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            items.extend(batch.iter().cloned().map(into_stored).zip(vectors));
        }

        let chunk_count = items.len();
        self.store
            .replace_all(
                items,
                &[
                    (META_EMBEDDING_MODEL, self.llm.embedding_model()),
                    (META_CORPUS_FINGERPRINT, fingerprint.as_str()),
                ],
            )
            .await?;

        tracing::info!("Document index saved ({} chunks)", chunk_count);
        Ok(IndexReport {
            documents: documents.len(),
            chunks: chunk_count,
            rebuilt: true,
        })
    }
}
