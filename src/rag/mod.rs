//! Retrieval-augmented generation over the local document folder.
//!
//! - `loader` / `splitter`: read documents and cut them into chunks
//! - `store` / `sqlite`: the vector index
//! - `indexer`: keeps the index in sync with the documents
//! - `pipeline`: gate, retrieve, prompt, answer

pub mod indexer;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod splitter;
pub mod sqlite;
pub mod store;

pub use indexer::{IndexReport, RagIndexer};
pub use pipeline::{RagPipeline, RagResponse};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
