//! Trait definitions for external interactions
//!
//! These traits define the boundary between the consent authority and its
//! storage. Implementations live in `consent-store`.

use crate::{ConsentArtifact, ConsentId};

/// Keyed persistence for consent artifacts
///
/// Only single-artifact atomic overwrite is required; there are no
/// transactions and no secondary indices. `values` is the access path used
/// by the validation scan.
pub trait ConsentStore {
    /// Error type for store operations
    type Error;

    /// Insert a new artifact under `id`; fails if `id` is already present
    fn put(&mut self, id: &ConsentId, artifact: ConsentArtifact) -> Result<(), Self::Error>;

    /// Get an artifact by ID
    fn get(&self, id: &ConsentId) -> Result<Option<ConsentArtifact>, Self::Error>;

    /// Overwrite the artifact stored under `id`; fails if `id` is absent
    fn update(&mut self, id: &ConsentId, artifact: ConsentArtifact) -> Result<(), Self::Error>;

    /// Every stored artifact, in the store's iteration order
    fn values(&self) -> Result<Vec<ConsentArtifact>, Self::Error>;

    /// Number of stored artifacts
    fn len(&self) -> Result<usize, Self::Error> {
        Ok(self.values()?.len())
    }

    /// Whether the store holds no artifacts
    fn is_empty(&self) -> Result<bool, Self::Error> {
        Ok(self.len()? == 0)
    }
}
