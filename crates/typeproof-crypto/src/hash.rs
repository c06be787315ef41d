//! # Field Hashing Capability
//!
//! The hash every Merkle node, commitment, nullifier, attestation message and
//! trust hash is built from. It must match, byte for byte, the hash the
//! external circuits use; callers inject the production implementation (a
//! Poseidon binding over BN254) behind [`FieldHasher`].
//!
//! [`Sha256FieldHasher`] is the reference implementation for tests and for
//! deployments that verify with a SHA-256 based circuit. It is
//! domain-separated and reduces the digest modulo the field prime.

use sha2::{Digest, Sha256};
use typeproof_core::FieldElement;

/// Hash an ordered list of field elements to one field element.
///
/// Implementations must be deterministic and must treat `[a, b]` and
/// `[b, a]` as different inputs.
pub trait FieldHasher: Send + Sync + std::fmt::Debug {
    /// Hash `inputs` in order.
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement;

    /// Two-input hash. Merkle nodes use this.
    fn hash2(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        self.hash(&[*left, *right])
    }
}

/// Domain separation tag for [`Sha256FieldHasher`].
pub const SHA256_FIELD_HASH_DOMAIN: &[u8] = b"typeproof.field-hash.v1";

/// `SHA256(domain || arity || be32(x_0) || ... || be32(x_n))` mod r.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256FieldHasher;

impl FieldHasher for Sha256FieldHasher {
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement {
        let mut hasher = Sha256::new();
        hasher.update(SHA256_FIELD_HASH_DOMAIN);
        hasher.update((inputs.len() as u32).to_be_bytes());
        for input in inputs {
            hasher.update(input.to_be_bytes());
        }
        FieldElement::from_be_bytes_mod_order(&hasher.finalize())
    }
}

/// An entity's public pseudonym: `hash(secret, salt)`.
pub fn derive_commitment(
    hasher: &dyn FieldHasher,
    entity_secret: &FieldElement,
    salt: &FieldElement,
) -> FieldElement {
    hasher.hash2(entity_secret, salt)
}

/// The per-context replay tag: `hash(secret, context_id)`.
pub fn derive_nullifier(
    hasher: &dyn FieldHasher,
    entity_secret: &FieldElement,
    context_id: &FieldElement,
) -> FieldElement {
    hasher.hash2(entity_secret, context_id)
}
