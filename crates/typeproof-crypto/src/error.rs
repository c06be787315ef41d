//! Error types for the crypto crate.

use thiserror::Error;
use typeproof_core::ErrorKind;

/// Failure inside a signing or key capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material had the wrong shape or could not be decoded.
    #[error("key error: {0}")]
    KeyError(String),

    /// The signing capability failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The operating system random source failed.
    #[error("random source unavailable: {0}")]
    Randomness(String),
}

impl CryptoError {
    /// Capability failures are internal: the caller's input was fine.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Failure of a Merkle tree operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// Depth outside the supported range.
    #[error("tree depth must be in 1..={max}, got {depth}")]
    InvalidDepth {
        /// Requested depth.
        depth: u32,
        /// Largest supported depth.
        max: u32,
    },

    /// Every leaf slot is occupied.
    #[error("tree is full: capacity {capacity}")]
    TreeFull {
        /// `2^depth`.
        capacity: u64,
    },

    /// No leaf exists at the requested index.
    #[error("leaf index {index} out of range (tree holds {len} leaves)")]
    IndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Current number of leaves.
        len: u64,
    },
}

impl MerkleError {
    /// Classify for the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDepth { .. } => ErrorKind::Validation,
            Self::TreeFull { .. } => ErrorKind::Conflict,
            Self::IndexOutOfRange { .. } => ErrorKind::NotFound,
        }
    }
}
