//! Consent Authority
//!
//! Issues, revokes and validates signed consent artifacts.
//!
//! The authority provides:
//! - A signing authority holding one Ed25519 keypair for the process lifetime
//! - A lifecycle manager that creates and revokes artifacts, re-signing on
//!   every state change
//! - A validation engine that answers real-time consent checks by scanning
//!   the store and re-verifying signatures
//!
//! # Examples
//!
//! ```no_run
//! use consent_authority::{ConsentManager, SigningAuthority, ValidationEngine};
//! use consent_domain::{NewConsent, Party, Purpose, ValidationQuery};
//! use consent_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let signer = Arc::new(SigningAuthority::generate("consent-manager", "consent-key").unwrap());
//! let mut manager = ConsentManager::new(MemoryStore::new(), Arc::clone(&signer));
//! let engine = ValidationEngine::new(signer);
//!
//! let request = NewConsent::new(Party::new("P1"), Party::new("F1"), vec![Purpose::new("buy")]);
//! let artifact = manager.create(request).unwrap();
//!
//! let verdict = engine
//!     .validate(manager.store(), &ValidationQuery::new("P1", "F1", "buy"))
//!     .unwrap();
//! assert!(verdict.is_valid());
//! ```

#![warn(missing_docs)]

mod error;
mod lifecycle;
mod signing;
mod validation;

pub use error::ConsentError;
pub use lifecycle::ConsentManager;
pub use signing::{
    PublicKeyInfo, SignatureError, SignedClaims, SigningAuthority, SIGNING_ALGORITHM,
};
pub use validation::ValidationEngine;
