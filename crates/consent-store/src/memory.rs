//! In-memory consent store

use crate::StoreError;
use consent_domain::{ConsentArtifact, ConsentId, ConsentStore};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// Transient, insertion-ordered consent store
///
/// Cloning yields another handle onto the same map. Contents live only as
/// long as the last handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: Arc<RwLock<IndexMap<ConsentId, ConsentArtifact>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsentStore for MemoryStore {
    type Error = StoreError;

    fn put(&mut self, id: &ConsentId, artifact: ConsentArtifact) -> Result<(), Self::Error> {
        let mut artifacts = self.artifacts.write().map_err(|_| StoreError::Poisoned)?;
        if artifacts.contains_key(id) {
            return Err(StoreError::Duplicate(*id));
        }
        artifacts.insert(*id, artifact);
        Ok(())
    }

    fn get(&self, id: &ConsentId) -> Result<Option<ConsentArtifact>, Self::Error> {
        let artifacts = self.artifacts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(artifacts.get(id).cloned())
    }

    fn update(&mut self, id: &ConsentId, artifact: ConsentArtifact) -> Result<(), Self::Error> {
        let mut artifacts = self.artifacts.write().map_err(|_| StoreError::Poisoned)?;
        match artifacts.get_mut(id) {
            Some(slot) => {
                *slot = artifact;
                Ok(())
            }
            None => Err(StoreError::NotFound(*id)),
        }
    }

    fn values(&self) -> Result<Vec<ConsentArtifact>, Self::Error> {
        let artifacts = self.artifacts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(artifacts.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, Self::Error> {
        let artifacts = self.artifacts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(artifacts.len())
    }
}
