//! Validation query and verdict
//!
//! A [`ValidationQuery`] asks whether a principal's consent for a fiduciary and
//! purpose is currently in force. The answer is a [`Verdict`].

use crate::{ConsentArtifact, ConsentId, ConsentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Real-time consent check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationQuery {
    /// Principal whose consent is sought (required)
    #[serde(default)]
    pub principal_id: String,

    /// Fiduciary that wants to process (required)
    #[serde(default)]
    pub fiduciary_id: String,

    /// Purpose of processing (required)
    #[serde(default)]
    pub purpose_id: String,

    /// Data categories that must all be covered; empty or absent means any
    #[serde(default)]
    pub data_types: Option<Vec<String>>,
}

impl ValidationQuery {
    /// Query without a data type constraint
    pub fn new(
        principal_id: impl Into<String>,
        fiduciary_id: impl Into<String>,
        purpose_id: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            fiduciary_id: fiduciary_id.into(),
            purpose_id: purpose_id.into(),
            data_types: None,
        }
    }

    /// Require the given data types
    pub fn with_data_types<I, T>(mut self, data_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.data_types = Some(data_types.into_iter().map(Into::into).collect());
        self
    }

    /// Requested data types, empty when unconstrained
    pub fn requested_data_types(&self) -> &[String] {
        self.data_types.as_deref().unwrap_or(&[])
    }

    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("principal_id", &self.principal_id),
            ("fiduciary_id", &self.fiduciary_id),
            ("purpose_id", &self.purpose_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Reference to the proof of the consent that satisfied a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRef {
    /// Signing key identifier
    pub kid: String,

    /// Compact JWS
    pub jws: String,
}

/// Details of a matching consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Matching consent
    pub consent_id: ConsentId,

    /// Its status (always active for a grant)
    pub status: ConsentStatus,

    /// When it was granted
    pub granted_at: DateTime<Utc>,

    /// Its signature, for independent verification
    pub proof: ProofRef,
}

impl Grant {
    /// Build a grant from a verified artifact; `None` if it carries no proof
    pub fn from_artifact(artifact: &ConsentArtifact) -> Option<Self> {
        let proof = artifact.proof.as_ref()?;
        Some(Self {
            consent_id: artifact.consent_id,
            status: artifact.status,
            granted_at: artifact.granted_at,
            proof: ProofRef {
                kid: proof.kid.clone(),
                jws: proof.jws.clone(),
            },
        })
    }
}

/// Why a query was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No active, matching, signature-valid consent exists
    NoMatchingConsent,
}

/// Result of a validation query
///
/// Serialises as `{"valid": true, ...grant}` or `{"valid": false, "reason": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A consent satisfies the query
    Granted(Grant),

    /// No consent satisfies the query
    Denied(DenialReason),
}

impl Verdict {
    /// Whether the query was satisfied
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Granted(_))
    }

    /// The satisfying grant, if any
    pub fn grant(&self) -> Option<&Grant> {
        match self {
            Verdict::Granted(grant) => Some(grant),
            Verdict::Denied(_) => None,
        }
    }
}

#[derive(Serialize)]
struct VerdictBody<'a> {
    valid: bool,
    #[serde(flatten)]
    grant: Option<&'a Grant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<DenialReason>,
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            Verdict::Granted(grant) => VerdictBody {
                valid: true,
                grant: Some(grant),
                reason: None,
            },
            Verdict::Denied(reason) => VerdictBody {
                valid: false,
                grant: None,
                reason: Some(*reason),
            },
        };
        body.serialize(serializer)
    }
}
