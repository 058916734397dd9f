//! Consent artifact - the signed record of a principal's permission
//!
//! Field names on [`ConsentArtifact`] are the persisted and wire contract.

use crate::{ConsentId, ConsentStatus, Party, Purpose, ValidationQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Schema version stamped on every artifact at creation
pub const SCHEMA_VERSION: &str = "1.0";

/// Consent method recorded when the caller does not supply one
pub const DEFAULT_CONSENT_METHOD: &str = "express_click";

/// Revocation reason recorded when the caller does not supply one
pub const DEFAULT_REVOCATION_REASON: &str = "user_revoked";

/// Signature envelope attached to an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Name of the signing authority
    pub signed_by: String,

    /// JWS algorithm identifier (e.g. "EdDSA")
    pub signing_algorithm: String,

    /// Identifier of the key that produced `jws`
    pub kid: String,

    /// Compact JWS over the artifact's signable view
    pub jws: String,
}

/// A consent artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentArtifact {
    /// Store key, assigned once at creation
    pub consent_id: ConsentId,

    /// Schema version, fixed at creation
    pub version: String,

    /// Whose data is governed
    pub data_principal: Party,

    /// Who may process the data
    pub data_fiduciary: Party,

    /// Purposes the consent covers (non-empty)
    pub purposes: Vec<Purpose>,

    /// Data categories the consent covers (may be empty)
    #[serde(default)]
    pub data_types: Vec<String>,

    /// How consent was obtained
    pub consent_method: String,

    /// When consent was granted; never changes
    pub granted_at: DateTime<Utc>,

    /// When consent takes effect
    pub starts_at: DateTime<Utc>,

    /// When consent lapses; `None` means no expiry
    pub expires_at: Option<DateTime<Utc>>,

    /// Lifecycle state
    pub status: ConsentStatus,

    /// Set on revocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    /// Set on revocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,

    /// Caller-supplied free-form data, passed through unchanged
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Signature over every other field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

/// Input for creating a consent
///
/// Required fields are optional at the type level so that a missing one is
/// reported as a validation failure rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewConsent {
    /// Whose data is governed (required)
    #[serde(default)]
    pub data_principal: Option<Party>,

    /// Who may process the data (required)
    #[serde(default)]
    pub data_fiduciary: Option<Party>,

    /// Purposes covered (required, non-empty)
    #[serde(default)]
    pub purposes: Option<Vec<Purpose>>,

    /// Data categories covered
    #[serde(default)]
    pub data_types: Option<Vec<String>>,

    /// How consent was obtained
    #[serde(default)]
    pub consent_method: Option<String>,

    /// When consent takes effect; defaults to the grant time
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,

    /// When consent lapses
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Free-form pass-through data
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Required creation fields that were absent or empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields(pub Vec<&'static str>);

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} required", self.0.join(", "))
    }
}

impl std::error::Error for MissingFields {}

impl NewConsent {
    /// Start a request with the three required fields
    pub fn new(principal: Party, fiduciary: Party, purposes: Vec<Purpose>) -> Self {
        Self {
            data_principal: Some(principal),
            data_fiduciary: Some(fiduciary),
            purposes: Some(purposes),
            ..Default::default()
        }
    }

    /// Set the covered data categories
    pub fn with_data_types<I, T>(mut self, data_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.data_types = Some(data_types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the expiry
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Names of required fields that are absent, or present but empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.data_principal.as_ref().is_none_or(|p| p.id.is_empty()) {
            missing.push("data_principal");
        }
        if self.data_fiduciary.as_ref().is_none_or(|p| p.id.is_empty()) {
            missing.push("data_fiduciary");
        }
        let purposes_ok = self
            .purposes
            .as_ref()
            .is_some_and(|ps| !ps.is_empty() && ps.iter().all(|p| !p.purpose_id.is_empty()));
        if !purposes_ok {
            missing.push("purposes");
        }
        missing
    }

    /// Build an unsigned, active artifact granted at `granted_at`
    pub fn into_artifact(
        self,
        consent_id: ConsentId,
        granted_at: DateTime<Utc>,
    ) -> Result<ConsentArtifact, MissingFields> {
        let missing = self.missing_fields();
        let (Some(data_principal), Some(data_fiduciary), Some(purposes), true) = (
            self.data_principal,
            self.data_fiduciary,
            self.purposes,
            missing.is_empty(),
        ) else {
            return Err(MissingFields(missing));
        };

        Ok(ConsentArtifact {
            consent_id,
            version: SCHEMA_VERSION.to_string(),
            data_principal,
            data_fiduciary,
            purposes,
            data_types: self.data_types.unwrap_or_default(),
            consent_method: self
                .consent_method
                .unwrap_or_else(|| DEFAULT_CONSENT_METHOD.to_string()),
            granted_at,
            starts_at: self.starts_at.unwrap_or(granted_at),
            expires_at: self.expires_at,
            status: ConsentStatus::Active,
            revoked_at: None,
            revocation_reason: None,
            metadata: self.metadata.unwrap_or_default(),
            proof: None,
        })
    }
}

impl ConsentArtifact {
    /// JSON view of the artifact without its proof
    ///
    /// This is the payload that gets signed, and the reference a token's
    /// payload is compared against on verification.
    pub fn signable(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut value {
            fields.remove("proof");
        }
        Ok(value)
    }

    /// Mark the artifact revoked
    ///
    /// Returns `false` and leaves the artifact untouched when it is already
    /// revoked. The caller is responsible for re-signing.
    pub fn revoke(&mut self, at: DateTime<Utc>, reason: Option<String>) -> bool {
        if !self.status.can_transition_to(ConsentStatus::Revoked) {
            return false;
        }
        self.status = ConsentStatus::Revoked;
        self.revoked_at = Some(at);
        self.revocation_reason =
            Some(reason.unwrap_or_else(|| DEFAULT_REVOCATION_REASON.to_string()));
        true
    }

    /// Whether the artifact is in the active state
    pub fn is_active(&self) -> bool {
        self.status == ConsentStatus::Active
    }

    /// Whether `expires_at` lies strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry < now)
    }

    /// Whether the principal's identifier equals `principal_id`
    pub fn principal_is(&self, principal_id: &str) -> bool {
        self.data_principal.id == principal_id
    }

    /// Whether the fiduciary's identifier equals `fiduciary_id`
    pub fn fiduciary_is(&self, fiduciary_id: &str) -> bool {
        self.data_fiduciary.id == fiduciary_id
    }

    /// Whether any purpose carries `purpose_id`
    pub fn covers_purpose(&self, purpose_id: &str) -> bool {
        self.purposes.iter().any(|p| p.purpose_id == purpose_id)
    }

    /// Whether every requested data type is covered
    ///
    /// An empty request places no constraint. Matching is exact string
    /// containment.
    pub fn covers_data_types(&self, requested: &[String]) -> bool {
        requested.iter().all(|dt| self.data_types.contains(dt))
    }

    /// Whether the artifact structurally satisfies `query` at `now`
    ///
    /// Checks, in order: active status, expiry, principal, fiduciary,
    /// purpose, data types. Signature verification is not part of this.
    pub fn matches(&self, query: &ValidationQuery, now: DateTime<Utc>) -> bool {
        self.is_active()
            && !self.is_expired_at(now)
            && self.principal_is(&query.principal_id)
            && self.fiduciary_is(&query.fiduciary_id)
            && self.covers_purpose(&query.purpose_id)
            && self.covers_data_types(query.requested_data_types())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn artifact_with(data_types: Vec<String>) -> ConsentArtifact {
        NewConsent::new(Party::new("P1"), Party::new("F1"), vec![Purpose::new("buy")])
            .with_data_types(data_types)
            .into_artifact(ConsentId::new(), Utc::now())
            .unwrap()
    }

    proptest! {
        /// Property: any subset of the granted data types is covered
        #[test]
        fn test_subset_always_covered(
            granted in proptest::collection::vec("[a-z]{1,6}", 0..8),
            picks in proptest::collection::vec(any::<proptest::sample::Index>(), 0..8),
        ) {
            let artifact = artifact_with(granted.clone());
            let requested: Vec<String> = if granted.is_empty() {
                Vec::new()
            } else {
                picks.iter().map(|i| granted[i.index(granted.len())].clone()).collect()
            };
            prop_assert!(artifact.covers_data_types(&requested));
        }

        /// Property: a type outside the granted set is never covered
        #[test]
        fn test_foreign_type_never_covered(
            granted in proptest::collection::vec("[a-z]{1,6}", 0..8),
            foreign in "[A-Z]{1,6}",
        ) {
            let artifact = artifact_with(granted);
            prop_assert!(!artifact.covers_data_types(&[foreign]));
        }
    }
}
