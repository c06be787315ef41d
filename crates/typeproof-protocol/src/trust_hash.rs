//! # Trust Hash
//!
//! A single field element committing to everything a verifier relied on
//! when it evaluated an entity: the entity's commitment, both registry roots,
//! the entity's public attestation count and its latest attestation id.
//!
//! A verifier keeps the hash from an evaluation and later calls
//! [`TrustHashService::is_fresh`]. Any registration, revocation or new
//! public attestation for the entity changes the hash.
//!
//! ## Encoding
//!
//! `hash(commitment, zk_root, public_root, count, last_id + 1, nonce)`, with
//! 0 in the `last_id` slot when there is no attestation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typeproof_core::{AttestationId, FieldElement};
use typeproof_crypto::FieldHasher;
use typeproof_registry::{AttesterRegistry, PublicTrustRegistry};

const SNAPSHOT_ATTEMPTS: usize = 4;

/// Inputs of one trust hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustHashInputs {
    /// The entity.
    pub entity_commitment: FieldElement,
    /// Attester registry root.
    pub zk_root: FieldElement,
    /// Public trust registry root.
    pub public_root: FieldElement,
    /// Public attestations for the entity.
    pub attestation_count: u64,
    /// Latest public attestation for the entity.
    pub last_attestation_id: Option<AttestationId>,
    /// Deployment nonce.
    pub nonce: FieldElement,
}

/// Hash `inputs`.
pub fn compute(hasher: &dyn FieldHasher, inputs: &TrustHashInputs) -> FieldElement {
    let last = inputs
        .last_attestation_id
        .map_or(0, |id| id.value().saturating_add(1));
    hasher.hash(&[
        inputs.entity_commitment,
        inputs.zk_root,
        inputs.public_root,
        FieldElement::from_u64(inputs.attestation_count),
        FieldElement::from_u64(last),
        inputs.nonce,
    ])
}

/// Computes trust hashes from the live registries.
#[derive(Debug, Clone)]
pub struct TrustHashService {
    hasher: Arc<dyn FieldHasher>,
    registry: Arc<AttesterRegistry>,
    public: Arc<PublicTrustRegistry>,
    nonce: FieldElement,
}

impl TrustHashService {
    /// Build over the two registries.
    pub fn new(
        hasher: Arc<dyn FieldHasher>,
        registry: Arc<AttesterRegistry>,
        public: Arc<PublicTrustRegistry>,
        nonce: FieldElement,
    ) -> Self {
        Self {
            hasher,
            registry,
            public,
            nonce,
        }
    }

    /// Current inputs for `commitment`.
    ///
    /// The public root, count and last id come from one read of the public
    /// log. The attester root is re-read afterwards and the pass repeats if
    /// its version moved, so both roots were current at the same instant.
    /// Under sustained attester churn the last pass is returned as is.
    pub fn snapshot_for(&self, commitment: &FieldElement) -> TrustHashInputs {
        let mut zk = self.registry.root_snapshot();
        let mut standing = self.public.standing_for(commitment);
        for _ in 0..SNAPSHOT_ATTEMPTS {
            let after = self.registry.root_snapshot();
            if after.version == zk.version {
                break;
            }
            zk = after;
            standing = self.public.standing_for(commitment);
        }
        TrustHashInputs {
            entity_commitment: *commitment,
            zk_root: zk.root,
            public_root: standing.root,
            attestation_count: standing.count,
            last_attestation_id: standing.last_attestation_id,
            nonce: self.nonce,
        }
    }

    /// Current trust hash for `commitment`.
    pub fn trust_hash_for(&self, commitment: &FieldElement) -> FieldElement {
        compute(self.hasher.as_ref(), &self.snapshot_for(commitment))
    }

    /// Whether `expected` still matches the live state.
    pub fn is_fresh(&self, commitment: &FieldElement, expected: &FieldElement) -> bool {
        self.trust_hash_for(commitment) == *expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeproof_core::{AttesterId, Clock, EntityType, FixedClock, Timestamp};
    use typeproof_crypto::{Ed25519Scheme, Sha256FieldHasher};
    use typeproof_registry::MemoryStore;

    fn inputs() -> TrustHashInputs {
        TrustHashInputs {
            entity_commitment: FieldElement::from_u64(1),
            zk_root: FieldElement::from_u64(2),
            public_root: FieldElement::from_u64(3),
            attestation_count: 0,
            last_attestation_id: None,
            nonce: FieldElement::zero(),
        }
    }

    #[test]
    fn none_and_id_zero_differ() {
        let h = Sha256FieldHasher;
        let none = compute(&h, &inputs());
        let first = compute(
            &h,
            &TrustHashInputs {
                last_attestation_id: Some(AttestationId(0)),
                ..inputs()
            },
        );
        assert_ne!(none, first);
    }

    #[test]
    fn nonce_is_bound() {
        let h = Sha256FieldHasher;
        let other = TrustHashInputs {
            nonce: FieldElement::from_u64(9),
            ..inputs()
        };
        assert_ne!(compute(&h, &inputs()), compute(&h, &other));
    }

    #[test]
    fn freshness_tracks_registry_changes() {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Timestamp::parse("2026-06-01T00:00:00Z").unwrap()));
        let hasher: Arc<dyn FieldHasher> = Arc::new(Sha256FieldHasher);
        let registry = Arc::new(
            AttesterRegistry::open(store.clone(), hasher.clone(), Arc::new(Ed25519Scheme), clock.clone(), 4)
                .unwrap(),
        );
        let public = Arc::new(PublicTrustRegistry::open(store, hasher.clone(), clock, 4).unwrap());
        let service = TrustHashService::new(hasher, registry.clone(), public.clone(), FieldElement::zero());

        let c = FieldElement::from_u64(77);
        let h0 = service.trust_hash_for(&c);
        assert!(service.is_fresh(&c, &h0));

        public
            .add_attestation(c, EntityType::HumanUser, FieldElement::from_u64(5))
            .unwrap();
        assert!(!service.is_fresh(&c, &h0));
        let h1 = service.trust_hash_for(&c);
        assert_eq!(service.snapshot_for(&c).attestation_count, 1);

        registry
            .register(AttesterId::new("acme").unwrap(), "Lab", [EntityType::HumanUser])
            .unwrap();
        assert!(!service.is_fresh(&c, &h1));
    }

    #[test]
    fn snapshot_is_consistent_under_concurrent_publishing() {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Timestamp::parse("2026-06-01T00:00:00Z").unwrap()));
        let hasher: Arc<dyn FieldHasher> = Arc::new(Sha256FieldHasher);
        let registry = Arc::new(
            AttesterRegistry::open(store.clone(), hasher.clone(), Arc::new(Ed25519Scheme), clock.clone(), 4)
                .unwrap(),
        );
        let public = Arc::new(PublicTrustRegistry::open(store, hasher.clone(), clock, 6).unwrap());
        let service = TrustHashService::new(hasher, registry, public.clone(), FieldElement::zero());
        let c = FieldElement::from_u64(77);

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..32 {
                    public
                        .add_attestation(c, EntityType::HumanUser, FieldElement::from_u64(5))
                        .unwrap();
                }
            });
            for _ in 0..64 {
                let snap = service.snapshot_for(&c);
                // Every attestation is for `c`, so a consistent read has
                // count == last_id + 1.
                assert_eq!(
                    snap.attestation_count,
                    snap.last_attestation_id.map_or(0, |id| id.value() + 1)
                );
            }
        });
        assert_eq!(service.snapshot_for(&c).public_root, public.root());
    }
}
