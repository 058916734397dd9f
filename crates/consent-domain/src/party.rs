//! Identity and purpose records
//!
//! Principals, fiduciaries and purposes are supplied by callers and stored
//! verbatim. Only the identifying field is ever interpreted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An opaque identity record for a data principal or data fiduciary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// Identifier used for equality matching; absent reads as empty
    #[serde(default)]
    pub id: String,

    /// Every other caller-supplied field, passed through unchanged
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Party {
    /// Create a party with only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Attach an extra pass-through attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// A purpose of processing referenced by `purpose_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purpose {
    /// Identifier used for equality matching; absent reads as empty
    #[serde(default)]
    pub purpose_id: String,

    /// Every other caller-supplied field, passed through unchanged
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Purpose {
    /// Create a purpose with only an identifier
    pub fn new(purpose_id: impl Into<String>) -> Self {
        Self {
            purpose_id: purpose_id.into(),
            attributes: Map::new(),
        }
    }

    /// Attach an extra pass-through attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}
