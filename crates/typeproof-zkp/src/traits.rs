//! # Proof System Trait
//!
//! The verifier capability the gateway delegates to. Proof generation happens
//! on the entity's side, outside this workspace; the node only verifies.
//!
//! Unlike a sealed backend list, this trait is open: operators plug in the
//! verifier that matches their compiled circuit (typically Groth16 over
//! BN254). The gateway treats `Ok(false)`, `MalformedProof` and
//! `UnsupportedKey` as an invalid proof; `Backend` is an internal failure
//! the caller may retry.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeproof_core::ErrorKind;

use crate::signals::PublicSignals;

/// Error raised by a verifier backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof or key is structurally malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The verification key does not belong to this backend.
    #[error("unsupported verification key: {0}")]
    UnsupportedKey(String),

    /// The backend failed for reasons unrelated to the proof.
    #[error("verifier backend failure: {0}")]
    Backend(String),
}

impl VerifyError {
    /// Malformed inputs are crypto failures; backend failures are internal.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedProof(_) | Self::UnsupportedKey(_) => ErrorKind::Crypto,
            Self::Backend(_) => ErrorKind::Internal,
        }
    }
}

/// An externally produced proof, as the prover tooling emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// Proof system identifier, e.g. `groth16`.
    pub protocol: String,
    /// Backend-specific proof body.
    pub data: serde_json::Value,
}

/// A verification key for one compiled circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationKey {
    /// Stable identifier, e.g. `type-proof-v1`.
    pub id: String,
    /// Proof system identifier.
    pub protocol: String,
    /// Backend-specific key body.
    pub data: serde_json::Value,
}

/// Zero-knowledge proof verifier.
pub trait ProofSystem: Send + Sync + std::fmt::Debug {
    /// Verify `proof` against `signals` under `vk`.
    ///
    /// `Ok(true)` when valid, `Ok(false)` when well-formed but invalid.
    fn verify(
        &self,
        vk: &VerificationKey,
        signals: &PublicSignals,
        proof: &Proof,
    ) -> Result<bool, VerifyError>;
}
