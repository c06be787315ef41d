//! # Identifier Newtypes
//!
//! Newtype wrappers for identifiers. You cannot pass a public attestation id
//! where an attester id is expected.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of an attester identifier.
pub const MAX_ATTESTER_ID_LEN: usize = 64;

/// Unique identifier of an attester, chosen by the registry operator.
///
/// Lowercase ASCII letters, digits, `-`, `_` and `.`; 1 to 64 characters.
/// Identifiers are never reused, even after revocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttesterId(String);

impl AttesterId {
    /// Validate and wrap an attester identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "attester_id" });
        }
        if id.len() > MAX_ATTESTER_ID_LEN {
            return Err(ValidationError::InvalidIdentifier {
                value: id,
                reason: format!("longer than {MAX_ATTESTER_ID_LEN} characters"),
            });
        }
        let valid = id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.'));
        if !valid {
            return Err(ValidationError::InvalidIdentifier {
                value: id,
                reason: "allowed characters are a-z, 0-9, '-', '_' and '.'".to_string(),
            });
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AttesterId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AttesterId> for String {
    fn from(id: AttesterId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AttesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic identifier of a public attestation, assigned from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestationId(pub u64);

impl AttestationId {
    /// The raw sequence number.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The identifier following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for AttestationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attestation:{}", self.0)
    }
}
