//! # Mock Proof System
//!
//! Deterministic, transparent stand-in for a real verifier. A mock proof is
//! `SHA256(vk.id || be32(signal_0) || ... || be32(signal_4))`, so it binds the
//! key and every public signal but proves nothing about hidden inputs.
//!
//! Never deploy this backend; it has no zero-knowledge or soundness
//! guarantees.

use serde_json::json;
use sha2::{Digest, Sha256};
use typeproof_core::hex;

use crate::signals::PublicSignals;
use crate::traits::{Proof, ProofSystem, VerificationKey, VerifyError};

/// Protocol identifier carried by mock proofs and keys.
pub const MOCK_PROTOCOL: &str = "mock-sha256";

/// Deterministic SHA-256 verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofSystem;

impl MockProofSystem {
    /// A key for this backend with the given id.
    pub fn verification_key(id: impl Into<String>) -> VerificationKey {
        VerificationKey {
            id: id.into(),
            protocol: MOCK_PROTOCOL.to_string(),
            data: serde_json::Value::Null,
        }
    }

    /// Produce the proof this backend accepts for `signals` under `vk`.
    pub fn prove(vk: &VerificationKey, signals: &PublicSignals) -> Proof {
        Proof {
            protocol: MOCK_PROTOCOL.to_string(),
            data: json!({ "digest": Self::digest(vk, signals) }),
        }
    }

    fn digest(vk: &VerificationKey, signals: &PublicSignals) -> String {
        let mut hasher = Sha256::new();
        hasher.update(vk.id.as_bytes());
        for signal in signals.to_array() {
            hasher.update(signal.to_be_bytes());
        }
        hex::encode(&hasher.finalize())
    }
}

impl ProofSystem for MockProofSystem {
    fn verify(
        &self,
        vk: &VerificationKey,
        signals: &PublicSignals,
        proof: &Proof,
    ) -> Result<bool, VerifyError> {
        if vk.protocol != MOCK_PROTOCOL {
            return Err(VerifyError::UnsupportedKey(vk.protocol.clone()));
        }
        if proof.protocol != MOCK_PROTOCOL {
            return Err(VerifyError::MalformedProof(format!(
                "expected protocol {MOCK_PROTOCOL}, got {}",
                proof.protocol
            )));
        }
        let digest = proof
            .data
            .get("digest")
            .and_then(|v| v.as_str())
            .ok_or_else(|| VerifyError::MalformedProof("missing digest".to_string()))?;
        Ok(digest == Self::digest(vk, signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeproof_core::FieldElement;

    fn signals() -> PublicSignals {
        PublicSignals::from_array([1, 2, 0x0101, 4, 5].map(FieldElement::from_u64))
    }

    #[test]
    fn accepts_own_proofs() {
        let vk = MockProofSystem::verification_key("type-proof-v1");
        let proof = MockProofSystem::prove(&vk, &signals());
        assert_eq!(MockProofSystem.verify(&vk, &signals(), &proof), Ok(true));
    }

    #[test]
    fn binds_every_signal_and_key() {
        let vk = MockProofSystem::verification_key("type-proof-v1");
        let proof = MockProofSystem::prove(&vk, &signals());
        let mut altered = signals();
        altered.context_id = FieldElement::from_u64(6);
        assert_eq!(MockProofSystem.verify(&vk, &altered, &proof), Ok(false));
        let other_vk = MockProofSystem::verification_key("type-proof-v2");
        assert_eq!(MockProofSystem.verify(&other_vk, &signals(), &proof), Ok(false));
    }

    #[test]
    fn malformed_inputs_are_errors() {
        let vk = MockProofSystem::verification_key("k");
        let bad = Proof {
            protocol: MOCK_PROTOCOL.to_string(),
            data: json!({}),
        };
        assert!(matches!(
            MockProofSystem.verify(&vk, &signals(), &bad),
            Err(VerifyError::MalformedProof(_))
        ));
        let groth = Proof {
            protocol: "groth16".to_string(),
            data: json!({}),
        };
        assert!(MockProofSystem.verify(&vk, &signals(), &groth).is_err());
        let foreign_vk = VerificationKey {
            id: "k".to_string(),
            protocol: "groth16".to_string(),
            data: json!({}),
        };
        assert!(matches!(
            MockProofSystem.verify(&foreign_vk, &signals(), &MockProofSystem::prove(&vk, &signals())),
            Err(VerifyError::UnsupportedKey(_))
        ));
    }
}
