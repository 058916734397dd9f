//! Configuration file parsing for the consent server.
//!
//! Loads settings from TOML files including bind address, signer identity,
//! logging filter and storage backend. Every field has a default.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),
}

/// Where consent artifacts are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Transient, lost on restart
    #[default]
    Memory,
    /// SQLite database file
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Backend selection (default: memory)
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database path, required for the sqlite backend
    #[serde(default)]
    pub path: Option<String>,
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (default: 3000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Name recorded as `signed_by` in proofs and as token issuer
    #[serde(default = "default_signer_name")]
    pub signer_name: String,

    /// Prefix of the generated key identifier
    #[serde(default = "default_key_id_prefix")]
    pub key_id_prefix: String,

    /// tracing filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    3000
}

fn default_signer_name() -> String {
    "consent-manager".to_string()
}

fn default_key_id_prefix() -> String {
    "consent-key".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            signer_name: default_signer_name(),
            key_id_prefix: default_key_id_prefix(),
            log_filter: default_log_filter(),
            storage: StorageConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check fields that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signer_name.is_empty() {
            return Err(ConfigError::MissingField("signer_name".to_string()));
        }
        if self.key_id_prefix.is_empty() {
            return Err(ConfigError::MissingField("key_id_prefix".to_string()));
        }
        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.path.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }
        Ok(())
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
