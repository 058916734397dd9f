//! Consent Server
//!
//! HTTP front end for the consent authority: issue, fetch, validate and
//! revoke consents, and publish the verification key.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{ServerConfig, StorageBackend};
use consent_authority::{SignatureError, SigningAuthority};
use consent_domain::ConsentStore;
use consent_store::{MemoryStore, SqliteStore, StoreError};
use handlers::{create_router, AppState};
use std::fmt::Display;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Signing key could not be set up
    #[error("Signing key error: {0}")]
    Signing(#[from] SignatureError),

    /// Store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start the consent HTTP server
///
/// Generates the process signing key, opens the configured store and serves
/// until the listener fails.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    init_tracing(&config.log_filter);

    info!("Starting consent server");
    info!("Bind address: {}", config.bind_addr());
    info!("Storage backend: {:?}", config.storage.backend);

    let signer = Arc::new(SigningAuthority::generate(
        &config.signer_name,
        &config.key_id_prefix,
    )?);
    info!(key_id = signer.key_id(), signer = signer.signer_name(), "Signing key ready");

    match config.storage.backend {
        StorageBackend::Memory => serve(&config, AppState::new(MemoryStore::new(), signer)).await,
        StorageBackend::Sqlite => {
            let path = config
                .storage
                .path
                .as_deref()
                .ok_or_else(|| config::ConfigError::MissingField("storage.path".to_string()))?;
            let store = SqliteStore::new(path)?;
            info!("Opened consent database at {}", path);
            serve(&config, AppState::new(store, signer)).await
        }
    }
}

async fn serve<S>(config: &ServerConfig, state: AppState<S>) -> Result<(), ServerError>
where
    S: ConsentStore + Send + 'static,
    S::Error: Display,
{
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Consent server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
