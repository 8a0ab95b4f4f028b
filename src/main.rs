use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use pawmedbot::core::config::AppPaths;
use pawmedbot::core::logging;
use pawmedbot::server;
use pawmedbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "server.log");

    let state = AppState::initialize(paths).await?;

    match state.indexer.ensure_index().await {
        Ok(report) if report.rebuilt => tracing::info!(
            "Indexed {} chunks from {} documents",
            report.chunks,
            report.documents
        ),
        Ok(_) => {}
        Err(err) => tracing::warn!(
            "Document index unavailable, answers will be limited until it is rebuilt: {}",
            err
        ),
    }

    let bind_addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("PAWMEDBOT_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
