//! Consent Storage Layer
//!
//! Implements the [`ConsentStore`](consent_domain::ConsentStore) trait twice:
//!
//! - [`MemoryStore`]: transient keyed store, the reference behaviour
//! - [`SqliteStore`]: durable store honouring the same read/write contract
//!
//! Both iterate in insertion order, so the validation scan sees the oldest
//! consent first.
//!
//! # Examples
//!
//! ```no_run
//! use consent_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for consent operations
//! ```

#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use consent_domain::ConsentId;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An artifact with this ID already exists
    #[error("Duplicate consent id: {0}")]
    Duplicate(ConsentId),

    /// No artifact with this ID exists
    #[error("Consent not found: {0}")]
    NotFound(ConsentId),

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}
