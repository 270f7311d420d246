//! Filestream server
//!
//! Stores uploaded files under one flat directory and serves them back.

use anyhow::Context;
use clap::Parser;
use filestream_files::StorageRoot;
use filestream_server::{FileService, Server, ServerConfig};
use std::path::PathBuf;

/// Filestream - chunked file upload, download and metadata server
#[derive(Parser)]
#[command(name = "filestream-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    listen: Option<String>,

    /// Storage directory, overrides the config file
    #[arg(short, long)]
    storage: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ServerConfig::load_or_default()?,
    };
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    if let Some(storage) = cli.storage {
        config.storage.root = storage;
    }
    config.validate()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt().with_env_filter(level).init();

    let root = StorageRoot::new(&config.storage.root);
    root.ensure_exists().await.with_context(|| {
        format!(
            "Failed to create storage directory {}",
            config.storage.root.display()
        )
    })?;

    let service = FileService::new(root, config.storage.chunk_size);
    let stats = service.stats().clone();
    let server = Server::bind(config.parse_listen_addr()?, service)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;

    tracing::info!(
        "Server started on {} (storage: {}, chunk size: {})",
        server.local_addr()?,
        config.storage.root.display(),
        config.storage.chunk_size
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    let snapshot = stats.snapshot();
    tracing::info!(
        "Served {} connections: {} uploads ({} bytes), {} downloads ({} bytes), {} metadata lookups, {} failed",
        snapshot.connections,
        snapshot.uploads,
        snapshot.bytes_received,
        snapshot.downloads,
        snapshot.bytes_sent,
        snapshot.metadata_lookups,
        snapshot.failed_calls
    );

    Ok(())
}
