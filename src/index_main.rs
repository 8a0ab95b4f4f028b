//! Rebuilds the document index without starting the server.

use std::sync::Arc;

use anyhow::Context;

use pawmedbot::core::config::AppPaths;
use pawmedbot::core::logging;
use pawmedbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "index.log");

    let state = AppState::initialize(paths).await?;
    tracing::info!(
        "Indexing documents from {}",
        state.indexer.documents_dir().display()
    );

    let report = state
        .indexer
        .build_index()
        .await
        .context("Failed to build document index")?;

    println!(
        "Indexed {} chunks from {} documents.",
        report.chunks, report.documents
    );
    Ok(())
}
