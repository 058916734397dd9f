//! Consent Server CLI
//!
//! Starts the consent HTTP server.

use clap::Parser;
use consent_server::config::{ServerConfig, StorageBackend};
use consent_server::start_server;
use std::path::PathBuf;

/// Consent manager - issue, validate and revoke signed consent artifacts.
#[derive(Debug, Parser)]
#[command(name = "consent-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Keep consents in this SQLite database instead of memory
    #[arg(long)]
    sqlite: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(port) = cli.port {
        config.bind_port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(path) = cli.sqlite {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = Some(path);
    }

    start_server(config).await?;

    Ok(())
}
