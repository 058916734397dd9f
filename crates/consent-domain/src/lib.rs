//! Consent Domain Layer
//!
//! This crate contains the data model for the consent authority. It defines
//! the consent artifact, the identity records it carries, the validation query
//! and verdict shapes, and the storage trait the other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Consent artifact**: a signed record of a principal's permission for a
//!   fiduciary to process data categories for stated purposes
//! - **Party**: an opaque identity record (principal or fiduciary) matched by `id`
//! - **Purpose**: a reason for processing, matched by `purpose_id`
//! - **Proof**: the signature envelope binding an artifact to the issuing key
//! - **Verdict**: the answer to "is this consent currently valid?"
//!
//! ## Architecture
//!
//! - Pure data and predicates only, no I/O
//! - Signing, lifecycle and validation live in `consent-authority`
//! - Store implementations live in `consent-store`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod id;
pub mod party;
pub mod query;
pub mod status;
pub mod traits;

// Re-exports for convenience
pub use artifact::{
    ConsentArtifact, NewConsent, Proof, DEFAULT_CONSENT_METHOD, DEFAULT_REVOCATION_REASON,
    SCHEMA_VERSION,
};
pub use id::{ConsentId, ParseConsentIdError};
pub use party::{Party, Purpose};
pub use query::{DenialReason, Grant, ProofRef, ValidationQuery, Verdict};
pub use status::ConsentStatus;
pub use traits::ConsentStore;
