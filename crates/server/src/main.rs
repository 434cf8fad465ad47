//! shelf-mcp server entry point.
//!
//! Boots the storefront MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shelf_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod catalog;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        backend = ?config.cache_backend,
        ttl_minutes = config.cache_ttl_minutes,
        per_page = config.per_page,
        "Starting shelf-mcp server on stdio transport"
    );

    let state = Arc::new(state::AppState::from_config(config).await?);
    let handler = handler::ShelfServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
