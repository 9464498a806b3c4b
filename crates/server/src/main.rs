//! chordstash server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use chordstash_core::cache::repository::ChordSheetRepository;
use chordstash_core::cache::seed;
use chordstash_core::{AppConfig, StoreDb};

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let db = StoreDb::open(&config.db_path).await?;

    if config.seed_samples {
        let repo = ChordSheetRepository::new(db.clone(), config.sheet_policy());
        let inserted = seed::seed_samples(&repo).await?;
        tracing::info!(inserted, "bootstrap seeding done");
    }

    tracing::info!("Starting chordstash server on stdio transport");

    let handler = handler::ChordStashServer::new(db, &config)?;
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
