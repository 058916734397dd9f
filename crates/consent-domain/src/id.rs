//! Consent identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const URN_PREFIX: &str = "urn:consent:uuid:";

/// Unique identifier for a consent artifact
///
/// Rendered as `urn:consent:uuid:<uuidv4>`. Assigned once at creation and
/// used as the store key; identifiers are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsentId(uuid::Uuid);

/// Error returned when a string is not a consent URN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConsentIdError(String);

impl fmt::Display for ParseConsentIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid consent id: {}", self.0)
    }
}

impl std::error::Error for ParseConsentIdError {}

impl ConsentId {
    /// Generate a fresh random identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use consent_domain::ConsentId;
    ///
    /// let id = ConsentId::new();
    /// assert!(id.to_string().starts_with("urn:consent:uuid:"));
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID
    pub fn uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for ConsentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URN_PREFIX, self.0)
    }
}

impl FromStr for ConsentId {
    type Err = ParseConsentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| ParseConsentIdError(s.to_string()))?;
        uuid::Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ParseConsentIdError(s.to_string()))
    }
}

impl Serialize for ConsentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConsentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
