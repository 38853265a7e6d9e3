//! Community Node - REST gateway for posts and Q&A threads.

use anyhow::Context;
use clap::Parser;
use community_node::api::{create_router, AppState};
use community_node::config::NodeConfig;
use community_node::credentials::connect_store;
use community_node::observability::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();

    let config = NodeConfig::parse();
    init_logging(&config.log_level, LogFormat::parse(&config.log_format));

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting community node");

    let cors = config.cors_policy()?;
    let store = connect_store(&config)?;
    let app = create_router(AppState::new(store), &cors);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %addr,
        store = ?config.store_backend,
        cors_origin = %config.cors_origin,
        "Node is ready"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
