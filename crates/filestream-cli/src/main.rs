//! Filestream client
//!
//! `filestream <upload|download|metadata> <filename>`

use anyhow::Context;
use clap::Parser;
use filestream_cli::{
    ClientConfig, Driver, DriverError, ErrorKind, FileClient, Operation, Progress,
    TransferProgress,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Filestream - upload, download and inspect files on a Filestream server
#[derive(Parser)]
#[command(name = "filestream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Operation: upload, download or metadata
    command: String,

    /// Local path (upload) or stored file name (download, metadata)
    filename: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address (host:port), overrides the config file
    #[arg(short, long)]
    server: Option<String>,

    /// Directory for downloaded files, overrides the config file
    #[arg(short, long)]
    download_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Unknown commands fail before any configuration or network I/O
    let operation = match cli.command.parse::<Operation>() {
        Ok(operation) => operation,
        Err(e) => return report(&e),
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(ErrorKind::Usage.exit_code());
        }
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    let client = FileClient::new(config.client.server_addr.clone())
        .with_chunk_size(config.client.chunk_size);
    let driver = Driver::new(client, config.client.download_dir.clone());

    let mut progress = progress_for(operation, &cli.filename);
    let result = driver
        .run(
            operation,
            &cli.filename,
            progress.as_mut().map(|p| p as &mut dyn Progress),
        )
        .await;

    match result {
        Ok(outcome) => {
            if let Some(progress) = &progress {
                progress.finish_with_message(format!("{operation} complete"));
            }
            println!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(progress) = &progress {
                progress.abandon();
            }
            report(&e)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ClientConfig::load_or_default()?,
    };

    if let Some(server) = &cli.server {
        config.client.server_addr.clone_from(server);
    }
    if let Some(dir) = &cli.download_dir {
        config.client.download_dir.clone_from(dir);
    }
    config.validate()?;
    Ok(config)
}

fn progress_for(operation: Operation, filename: &str) -> Option<TransferProgress> {
    match operation {
        Operation::Upload => {
            let path = Path::new(filename);
            let name = path
                .file_name()
                .map_or_else(|| filename.to_string(), |n| n.to_string_lossy().into_owned());
            Some(match std::fs::metadata(path) {
                Ok(meta) => TransferProgress::new(meta.len(), &name),
                Err(_) => TransferProgress::unbounded(&name),
            })
        }
        Operation::Download => Some(TransferProgress::unbounded(filename)),
        Operation::Metadata => None,
    }
}

fn report(err: &DriverError) -> ExitCode {
    eprintln!("error ({}): {}", err.kind(), err);
    ExitCode::from(err.exit_code())
}
