//! # Error Types and Shared Taxonomy
//!
//! Every crate in the workspace defines its own `thiserror` enum, and every
//! one of those enums exposes `kind() -> ErrorKind`. The kind is what a
//! transport layer maps onto status codes and what callers use to decide
//! whether a retry is meaningful.
//!
//! ## Retry Semantics
//!
//! - Idempotent reads (verify, proof lookup, root lookup) may be retried
//!   freely regardless of kind.
//! - `Staleness` means the caller must refetch the attester root and
//!   regenerate its proof; retrying the same request is pointless.
//! - Mutating calls (register, revoke, nullifier consumption) must check
//!   the resulting state before retrying after an `Internal` failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure, shared across all crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or unknown input, rejected before any mutation.
    Validation,
    /// Unknown or revoked credential.
    Auth,
    /// Authenticated but not permitted (type outside the attester's set).
    Forbidden,
    /// Duplicate identifier or already-consumed nullifier.
    Conflict,
    /// The referenced object does not exist.
    NotFound,
    /// Invalid signature or proof. Not retryable.
    Crypto,
    /// The proof embeds a superseded root.
    Staleness,
    /// Capability or storage failure. Never partially committed.
    Internal,
}

impl ErrorKind {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Crypto => "crypto",
            Self::Staleness => "staleness",
            Self::Internal => "internal",
        }
    }

    /// Whether re-issuing a request can succeed without the caller changing
    /// its inputs. Only internal failures qualify; staleness requires a new
    /// proof.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or blank.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An identifier did not satisfy its format rules.
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Entity type label or code not present in the type table.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Timestamp parsing or range failure.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Field element parsing failure.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl ValidationError {
    /// Always [`ErrorKind::Validation`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Error decoding a field element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The string was neither `0x`-hex nor decimal.
    #[error("invalid field element encoding: {0}")]
    InvalidEncoding(String),

    /// The value is not below the field modulus.
    #[error("field element is not canonical (value >= modulus)")]
    NonCanonical,
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_is_retryable() {
        let all = [
            ErrorKind::Validation,
            ErrorKind::Auth,
            ErrorKind::Forbidden,
            ErrorKind::Conflict,
            ErrorKind::NotFound,
            ErrorKind::Crypto,
            ErrorKind::Staleness,
            ErrorKind::Internal,
        ];
        let retryable: Vec<_> = all.iter().filter(|k| k.is_retryable()).collect();
        assert_eq!(retryable, vec![&ErrorKind::Internal]);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }

    #[test]
    fn field_error_converts_into_validation() {
        let err: ValidationError = FieldError::NonCanonical.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("not canonical"));
    }
}
