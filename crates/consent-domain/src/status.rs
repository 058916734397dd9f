//! Status module - lifecycle state of a consent artifact

use serde::{Deserialize, Serialize};

/// Status of a consent artifact
///
/// The only transition is `Active -> Revoked`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    /// Consent is in force (subject to expiry)
    Active,

    /// Consent has been withdrawn
    Revoked,
}

impl ConsentStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::Active => "active",
            ConsentStatus::Revoked => "revoked",
        }
    }

    /// Whether a transition from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: ConsentStatus) -> bool {
        matches!((self, next), (ConsentStatus::Active, ConsentStatus::Revoked))
    }
}

impl std::fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
