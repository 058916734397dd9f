//! Consent lifecycle: create, fetch, revoke

use crate::{ConsentError, SigningAuthority};
use chrono::Utc;
use consent_domain::{ConsentArtifact, ConsentId, ConsentStore, NewConsent};
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Sole writer of consent artifacts
///
/// Every state change is signed before it is written, so a stored artifact's
/// proof always covers its current content. `create` and `revoke` each
/// perform exactly one signing operation and one store write; the artifact
/// is fully built before the write.
pub struct ConsentManager<S> {
    store: S,
    signer: Arc<SigningAuthority>,
}

impl<S> ConsentManager<S>
where
    S: ConsentStore,
    S::Error: Display,
{
    /// Create a manager over `store`, signing with `signer`
    pub fn new(store: S, signer: Arc<SigningAuthority>) -> Self {
        Self { store, signer }
    }

    /// Issue a new consent
    ///
    /// Fails with [`ConsentError::Validation`] when the principal, fiduciary
    /// or purposes are missing.
    pub fn create(&mut self, request: NewConsent) -> Result<ConsentArtifact, ConsentError> {
        let consent_id = ConsentId::new();
        let mut artifact = request
            .into_artifact(consent_id, Utc::now())
            .map_err(|e| ConsentError::Validation(e.to_string()))?;

        self.signer.sign_artifact(&mut artifact)?;
        self.store
            .put(&consent_id, artifact.clone())
            .map_err(ConsentError::store)?;

        info!(
            consent_id = %consent_id,
            principal = %artifact.data_principal.id,
            fiduciary = %artifact.data_fiduciary.id,
            purposes = artifact.purposes.len(),
            "Consent granted"
        );

        Ok(artifact)
    }

    /// Fetch a consent by ID
    pub fn get(&self, id: &ConsentId) -> Result<ConsentArtifact, ConsentError> {
        self.store
            .get(id)
            .map_err(ConsentError::store)?
            .ok_or_else(|| ConsentError::NotFound(id.to_string()))
    }

    /// Revoke a consent
    ///
    /// An empty or absent reason records the default reason. Revoking an
    /// already revoked consent fails and leaves it untouched.
    pub fn revoke(
        &mut self,
        id: &ConsentId,
        reason: Option<String>,
    ) -> Result<ConsentArtifact, ConsentError> {
        let mut artifact = self.get(id)?;

        let reason = reason.filter(|r| !r.is_empty());
        if !artifact.revoke(Utc::now(), reason) {
            return Err(ConsentError::AlreadyRevoked(id.to_string()));
        }

        self.signer.sign_artifact(&mut artifact)?;
        self.store
            .update(id, artifact.clone())
            .map_err(ConsentError::store)?;

        info!(
            consent_id = %id,
            reason = artifact.revocation_reason.as_deref().unwrap_or_default(),
            "Consent revoked"
        );

        Ok(artifact)
    }

    /// Read-only access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The signing authority used for every write
    pub fn signer(&self) -> &Arc<SigningAuthority> {
        &self.signer
    }
}
