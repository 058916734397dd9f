//! Consent authority error types

use crate::SignatureError;
use thiserror::Error;

/// Errors surfaced by lifecycle and validation operations
///
/// Every variant is a recoverable outcome for the caller.
#[derive(Error, Debug)]
pub enum ConsentError {
    /// Required input fields are missing
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown consent ID
    #[error("Consent not found: {0}")]
    NotFound(String),

    /// Revoke called on an already revoked consent
    #[error("Consent already revoked: {0}")]
    AlreadyRevoked(String),

    /// Signing or verification failed
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),
}

impl ConsentError {
    pub(crate) fn store<E: std::fmt::Display>(error: E) -> Self {
        ConsentError::Store(error.to_string())
    }

    pub(crate) fn missing_fields(fields: &[&str]) -> Self {
        ConsentError::Validation(format!("{} required", fields.join(", ")))
    }
}
