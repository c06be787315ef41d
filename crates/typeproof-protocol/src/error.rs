//! # Protocol Errors
//!
//! [`ProtocolError`] is what every service in this crate returns. Registry
//! and ledger errors that have a protocol-level meaning (unknown credential,
//! replayed nullifier) are lifted into dedicated variants; the rest are
//! carried through unchanged.

use thiserror::Error;
use typeproof_core::{AttesterId, EntityType, ErrorKind, FieldElement, ValidationError};
use typeproof_crypto::CryptoError;
use typeproof_registry::{NullifierError, RegistryError, StorageError};
use typeproof_zkp::{SignalError, VerifyError};

use crate::config::ConfigError;

/// Failure of a protocol operation.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Unknown or revoked attester credential.
    #[error("unauthorized: unknown or revoked credential")]
    Unauthorized,

    /// The claimed type label is not in the type table.
    #[error("invalid entity type: {0}")]
    InvalidType(String),

    /// The attester may not vouch for this type.
    #[error("attester {attester_id} is not permitted to attest {entity_type}")]
    Forbidden {
        /// The authenticated attester.
        attester_id: AttesterId,
        /// The refused type.
        entity_type: EntityType,
    },

    /// The signature capability failed.
    #[error("signing failed: {0}")]
    SigningError(#[source] CryptoError),

    /// Proof, signature or membership check failed.
    #[error("proof invalid: {0}")]
    ProofInvalid(String),

    /// The verifier backend failed for reasons unrelated to the proof.
    #[error("proof verifier failed: {0}")]
    Verifier(#[source] VerifyError),

    /// The proof embeds a root other than the current one.
    #[error("attesters root mismatch: proof has {presented}, current is {current}")]
    RootMismatch {
        /// Root in the proof.
        presented: FieldElement,
        /// Current registry root.
        current: FieldElement,
    },

    /// The nullifier was already consumed.
    #[error("nullifier already used: {0}")]
    NullifierUsed(FieldElement),

    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed public signals.
    #[error(transparent)]
    Signals(#[from] SignalError),

    /// Registry failure.
    #[error(transparent)]
    Registry(RegistryError),

    /// Nullifier store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProtocolError {
    /// Classify for the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Auth,
            Self::InvalidType(_) => ErrorKind::Validation,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::SigningError(_) => ErrorKind::Internal,
            Self::ProofInvalid(_) => ErrorKind::Crypto,
            Self::Verifier(e) => e.kind(),
            Self::RootMismatch { .. } => ErrorKind::Staleness,
            Self::NullifierUsed(_) => ErrorKind::Conflict,
            Self::Validation(e) => e.kind(),
            Self::Signals(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            Self::Storage(e) => e.kind(),
            Self::Config(e) => e.kind(),
        }
    }
}

impl From<RegistryError> for ProtocolError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unauthorized => Self::Unauthorized,
            RegistryError::Validation(e) => Self::Validation(e),
            other => Self::Registry(other),
        }
    }
}

impl From<NullifierError> for ProtocolError {
    fn from(err: NullifierError) -> Self {
        match err {
            NullifierError::NullifierUsed(n) => Self::NullifierUsed(n),
            NullifierError::Storage(e) => Self::Storage(e),
        }
    }
}
