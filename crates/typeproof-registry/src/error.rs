//! Error types for the registries and the nullifier ledger.

use thiserror::Error;
use typeproof_core::{AttesterId, ErrorKind, FieldElement, ValidationError};
use typeproof_crypto::{CryptoError, MerkleError};

/// Failure of the storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend rejected or failed the operation. Nothing was written.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Always [`ErrorKind::Internal`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Failure of an attester or public trust registry operation.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The attester id is taken. Ids are never reused, even after revocation.
    #[error("attester already exists: {0}")]
    AlreadyExists(AttesterId),

    /// No such attester, or it is already revoked.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown or revoked credential.
    #[error("unauthorized: unknown or revoked credential")]
    Unauthorized,

    /// Input failed validation before any mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Stored state does not replay to the stored root.
    #[error("registry corruption detected: {0}")]
    Corruption(String),

    /// Tree operation failed.
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Storage commit or load failed. State is unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Key generation or credential generation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl RegistryError {
    /// Classify for the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized => ErrorKind::Auth,
            Self::Validation(e) => e.kind(),
            Self::Corruption(_) => ErrorKind::Internal,
            Self::Merkle(e) => e.kind(),
            Self::Storage(e) => e.kind(),
            Self::Crypto(e) => e.kind(),
        }
    }
}

/// Failure of a nullifier ledger operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NullifierError {
    /// The nullifier was consumed before.
    #[error("nullifier already used: {0}")]
    NullifierUsed(FieldElement),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl NullifierError {
    /// Classify for the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullifierUsed(_) => ErrorKind::Conflict,
            Self::Storage(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let id = AttesterId::new("acme").unwrap();
        assert_eq!(RegistryError::AlreadyExists(id).kind(), ErrorKind::Conflict);
        assert_eq!(RegistryError::Unauthorized.kind(), ErrorKind::Auth);
        assert_eq!(
            RegistryError::Merkle(MerkleError::TreeFull { capacity: 2 }).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            NullifierError::NullifierUsed(FieldElement::zero()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            NullifierError::Storage(StorageError::Backend("down".into())).kind(),
            ErrorKind::Internal
        );
    }
}
