//! # Public Trust Registry
//!
//! Append-only log of visible attestations, accumulated in its own Merkle
//! tree. It is the "public" half of the dual-proof model: the coordinator
//! counts attestations per commitment to decide standing.
//!
//! ## Leaf Layout
//!
//! `hash(entity_commitment, type_code, attester_pubkey_hash, timestamp_secs,
//! attestation_id)`. The leaf is stored with the row and re-derived on open;
//! a mismatch is corruption.
//!
//! ## Security Invariant
//!
//! Ids are assigned from 0 with no gaps. Records are immutable once
//! appended. An audited append writes the record and its audit entry in
//! one store call, so a failed append leaves no trace in either.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use typeproof_core::{AttestationId, Clock, EntityType, FieldElement, Timestamp};
use typeproof_crypto::{FieldHasher, IncrementalMerkleTree, MerkleProof};

use crate::audit::{AuditAction, AuditEntry};
use crate::error::RegistryError;
use crate::storage::PublicTrustStore;

/// A visible attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAttestation {
    /// Monotonic id, from 0.
    pub attestation_id: AttestationId,
    /// The attested entity's pseudonym.
    pub entity_commitment: FieldElement,
    /// The attested type.
    pub entity_type: EntityType,
    /// `hash(pubkey.x, pubkey.y)` of the issuing attester.
    pub attester_pubkey_hash: FieldElement,
    /// When it was appended.
    pub timestamp: Timestamp,
    /// The Merkle leaf for this record.
    pub leaf: FieldElement,
}

/// Compute the leaf for a public attestation.
pub fn public_attestation_leaf(
    hasher: &dyn FieldHasher,
    entity_commitment: &FieldElement,
    entity_type: EntityType,
    attester_pubkey_hash: &FieldElement,
    timestamp: &Timestamp,
    attestation_id: AttestationId,
) -> FieldElement {
    let secs = u64::try_from(timestamp.epoch_secs()).unwrap_or(0);
    hasher.hash(&[
        *entity_commitment,
        entity_type.to_field(),
        *attester_pubkey_hash,
        FieldElement::from_u64(secs),
        FieldElement::from_u64(attestation_id.value()),
    ])
}

/// The public-side inputs of a trust decision, read in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicStanding {
    /// Root of the public tree.
    pub root: FieldElement,
    /// Attestations for the commitment.
    pub count: u64,
    /// Highest id recorded for the commitment.
    pub last_attestation_id: Option<AttestationId>,
}

struct PublicState {
    tree: IncrementalMerkleTree,
    attestations: Vec<PublicAttestation>,
    by_commitment: HashMap<FieldElement, Vec<usize>>,
}

/// The public attestation log.
pub struct PublicTrustRegistry {
    store: Arc<dyn PublicTrustStore>,
    hasher: Arc<dyn FieldHasher>,
    clock: Arc<dyn Clock>,
    state: RwLock<PublicState>,
}

impl PublicTrustRegistry {
    /// Open over `store`, replaying every stored attestation.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Corruption`] if ids have gaps or a stored leaf does
    /// not match its fields.
    pub fn open(
        store: Arc<dyn PublicTrustStore>,
        hasher: Arc<dyn FieldHasher>,
        clock: Arc<dyn Clock>,
        depth: u32,
    ) -> Result<Self, RegistryError> {
        let attestations = store.load_public_attestations()?;
        let mut tree = IncrementalMerkleTree::new(depth, hasher.clone())?;
        let mut by_commitment: HashMap<FieldElement, Vec<usize>> = HashMap::new();
        for (position, att) in attestations.iter().enumerate() {
            if att.attestation_id.value() != position as u64 {
                return Err(RegistryError::Corruption(format!(
                    "public attestation at position {position} has id {}",
                    att.attestation_id
                )));
            }
            let expected = public_attestation_leaf(
                hasher.as_ref(),
                &att.entity_commitment,
                att.entity_type,
                &att.attester_pubkey_hash,
                &att.timestamp,
                att.attestation_id,
            );
            if expected != att.leaf {
                return Err(RegistryError::Corruption(format!(
                    "leaf mismatch for {}",
                    att.attestation_id
                )));
            }
            tree.add_leaf(att.leaf)?;
            by_commitment.entry(att.entity_commitment).or_default().push(position);
        }
        tracing::info!(attestations = attestations.len(), root = %tree.root(), "public trust registry opened");
        Ok(Self {
            store,
            hasher,
            clock,
            state: RwLock::new(PublicState {
                tree,
                attestations,
                by_commitment,
            }),
        })
    }

    /// Append a visible attestation.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Merkle`] with `TreeFull` at capacity;
    /// [`RegistryError::Storage`] if the append fails. Either way nothing
    /// changes.
    pub fn add_attestation(
        &self,
        entity_commitment: FieldElement,
        entity_type: EntityType,
        attester_pubkey_hash: FieldElement,
    ) -> Result<PublicAttestation, RegistryError> {
        let mut state = self.state.write();
        let (tree, record) = self.stage(&state, entity_commitment, entity_type, attester_pubkey_hash)?;
        self.store.append_public_attestation(record.clone(), None)?;
        Ok(self.apply(&mut state, tree, record))
    }

    /// Append a visible attestation and its `PublicAttestationAdded` audit
    /// entry in one store write, attributed to `subject`.
    ///
    /// The returned entry is already durable.
    ///
    /// # Errors
    ///
    /// As [`Self::add_attestation`]. On `Err` neither the record nor the
    /// audit entry was written.
    pub fn add_audited_attestation(
        &self,
        entity_commitment: FieldElement,
        entity_type: EntityType,
        attester_pubkey_hash: FieldElement,
        subject: &str,
    ) -> Result<(PublicAttestation, AuditEntry), RegistryError> {
        let mut state = self.state.write();
        let (tree, record) = self.stage(&state, entity_commitment, entity_type, attester_pubkey_hash)?;
        let entry = AuditEntry::new(
            AuditAction::PublicAttestationAdded,
            subject,
            json!({
                "attestation_id": record.attestation_id.value(),
                "entity_type": entity_type.as_str(),
                "public_root": tree.root().to_hex(),
            }),
            record.timestamp,
        );
        self.store
            .append_public_attestation(record.clone(), Some(entry.clone()))?;
        Ok((self.apply(&mut state, tree, record), entry))
    }

    fn stage(
        &self,
        state: &PublicState,
        entity_commitment: FieldElement,
        entity_type: EntityType,
        attester_pubkey_hash: FieldElement,
    ) -> Result<(IncrementalMerkleTree, PublicAttestation), RegistryError> {
        let attestation_id = AttestationId(state.attestations.len() as u64);
        let timestamp = self.clock.now();
        let leaf = public_attestation_leaf(
            self.hasher.as_ref(),
            &entity_commitment,
            entity_type,
            &attester_pubkey_hash,
            &timestamp,
            attestation_id,
        );
        let mut staged = state.tree.clone();
        staged.add_leaf(leaf)?;
        let record = PublicAttestation {
            attestation_id,
            entity_commitment,
            entity_type,
            attester_pubkey_hash,
            timestamp,
            leaf,
        };
        Ok((staged, record))
    }

    fn apply(&self, state: &mut PublicState, tree: IncrementalMerkleTree, record: PublicAttestation) -> PublicAttestation {
        let position = state.attestations.len();
        state.tree = tree;
        state.attestations.push(record.clone());
        state.by_commitment.entry(record.entity_commitment).or_default().push(position);
        tracing::info!(
            attestation_id = %record.attestation_id,
            entity_type = %record.entity_type,
            root = %state.tree.root(),
            "public attestation added"
        );
        record
    }

    /// Number of attestations for `commitment`.
    pub fn count_for(&self, commitment: &FieldElement) -> u64 {
        self.state
            .read()
            .by_commitment
            .get(commitment)
            .map_or(0, |v| v.len() as u64)
    }

    /// Attestations for `commitment`, ordered by id.
    pub fn attestations_for(&self, commitment: &FieldElement) -> Vec<PublicAttestation> {
        let state = self.state.read();
        state
            .by_commitment
            .get(commitment)
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&p| state.attestations.get(p).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Highest id recorded for `commitment`.
    pub fn last_attestation_id_for(&self, commitment: &FieldElement) -> Option<AttestationId> {
        let state = self.state.read();
        state
            .by_commitment
            .get(commitment)
            .and_then(|positions| positions.last())
            .and_then(|&p| state.attestations.get(p))
            .map(|a| a.attestation_id)
    }

    /// Root, count and latest id for `commitment`, all from one version of
    /// the log.
    pub fn standing_for(&self, commitment: &FieldElement) -> PublicStanding {
        let state = self.state.read();
        let positions = state.by_commitment.get(commitment);
        PublicStanding {
            root: state.tree.root(),
            count: positions.map_or(0, |v| v.len() as u64),
            last_attestation_id: positions
                .and_then(|v| v.last())
                .and_then(|&p| state.attestations.get(p))
                .map(|a| a.attestation_id),
        }
    }

    /// A single attestation by id.
    pub fn get(&self, id: AttestationId) -> Option<PublicAttestation> {
        let index = usize::try_from(id.value()).ok()?;
        self.state.read().attestations.get(index).cloned()
    }

    /// Inclusion proof for attestation `id`.
    pub fn proof_for(&self, id: AttestationId) -> Result<MerkleProof, RegistryError> {
        let state = self.state.read();
        if id.value() >= state.tree.len() {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(state.tree.proof(id.value())?)
    }

    /// Current root of the public tree.
    pub fn root(&self) -> FieldElement {
        self.state.read().tree.root()
    }

    /// Total number of attestations.
    pub fn len(&self) -> u64 {
        self.state.read().attestations.len() as u64
    }

    /// True when nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The hasher leaves are built with.
    pub fn hasher(&self) -> &Arc<dyn FieldHasher> {
        &self.hasher
    }
}

impl std::fmt::Debug for PublicTrustRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PublicTrustRegistry")
            .field("len", &state.attestations.len())
            .field("root", &state.tree.root())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use typeproof_core::FixedClock;
    use typeproof_crypto::Sha256FieldHasher;

    fn fe(n: u64) -> FieldElement {
        FieldElement::from_u64(n)
    }

    fn setup(depth: u32) -> (Arc<MemoryStore>, Arc<FixedClock>, PublicTrustRegistry) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(Timestamp::parse("2026-04-01T00:00:00Z").unwrap()));
        let registry =
            PublicTrustRegistry::open(store.clone(), Arc::new(Sha256FieldHasher), clock.clone(), depth)
                .unwrap();
        (store, clock, registry)
    }

    #[test]
    fn ids_are_monotonic_and_counts_per_commitment() {
        let (_, clock, registry) = setup(4);
        let a = registry.add_attestation(fe(7), EntityType::HumanUser, fe(100)).unwrap();
        clock.advance_secs(10);
        let b = registry.add_attestation(fe(8), EntityType::RobotService, fe(100)).unwrap();
        let c = registry.add_attestation(fe(7), EntityType::HumanVerified, fe(101)).unwrap();
        assert_eq!(
            [a.attestation_id, b.attestation_id, c.attestation_id],
            [AttestationId(0), AttestationId(1), AttestationId(2)]
        );
        assert_eq!(registry.count_for(&fe(7)), 2);
        assert_eq!(registry.count_for(&fe(9)), 0);
        let history = registry.attestations_for(&fe(7));
        assert_eq!(history, vec![a, c]);
        assert_eq!(registry.last_attestation_id_for(&fe(7)), Some(AttestationId(2)));
        assert_eq!(registry.last_attestation_id_for(&fe(9)), None);

        let standing = registry.standing_for(&fe(7));
        assert_eq!(standing.root, registry.root());
        assert_eq!(standing.count, 2);
        assert_eq!(standing.last_attestation_id, Some(AttestationId(2)));
        assert_eq!(
            registry.standing_for(&fe(9)),
            PublicStanding {
                root: registry.root(),
                count: 0,
                last_attestation_id: None,
            }
        );
    }

    #[test]
    fn proofs_verify_against_root() {
        let (_, _, registry) = setup(3);
        for n in 0..5 {
            registry.add_attestation(fe(n), EntityType::AiAnalyticalSystem, fe(1)).unwrap();
        }
        let root = registry.root();
        for id in 0..5 {
            let proof = registry.proof_for(AttestationId(id)).unwrap();
            assert!(proof.verify(&root, &Sha256FieldHasher));
            assert_eq!(proof.leaf, registry.get(AttestationId(id)).unwrap().leaf);
        }
        assert!(matches!(
            registry.proof_for(AttestationId(5)),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn full_tree_and_failed_append_change_nothing() {
        let (store, _, registry) = setup(1);
        registry.add_attestation(fe(1), EntityType::HumanUser, fe(1)).unwrap();
        let root = registry.root();
        store.fail_next_commit();
        assert!(matches!(
            registry.add_attestation(fe(2), EntityType::HumanUser, fe(1)),
            Err(RegistryError::Storage(_))
        ));
        assert_eq!(registry.root(), root);
        assert_eq!(registry.len(), 1);
        registry.add_attestation(fe(2), EntityType::HumanUser, fe(1)).unwrap();
        assert!(matches!(
            registry.add_attestation(fe(3), EntityType::HumanUser, fe(1)),
            Err(RegistryError::Merkle(_))
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn audited_append_is_all_or_nothing() {
        let (store, _, registry) = setup(4);
        store.fail_next_commit();
        assert!(matches!(
            registry.add_audited_attestation(fe(1), EntityType::HumanUser, fe(9), "acme"),
            Err(RegistryError::Storage(_))
        ));
        assert_eq!(registry.count_for(&fe(1)), 0);
        assert_eq!(store.audit_len(), 0);

        let (record, entry) = registry
            .add_audited_attestation(fe(1), EntityType::HumanUser, fe(9), "acme")
            .unwrap();
        assert_eq!(record.attestation_id, AttestationId(0));
        assert_eq!(entry.action, AuditAction::PublicAttestationAdded);
        assert_eq!(entry.metadata["public_root"], registry.root().to_hex());
        assert_eq!(registry.count_for(&fe(1)), 1);
        assert_eq!(store.audit_len(), 1);
    }

    fn forged_row(id: u64, hasher: &dyn FieldHasher) -> PublicAttestation {
        let timestamp = Timestamp::parse("2026-04-01T00:00:00Z").unwrap();
        let attestation_id = AttestationId(id);
        PublicAttestation {
            attestation_id,
            entity_commitment: fe(5),
            entity_type: EntityType::RobotService,
            attester_pubkey_hash: fe(9),
            timestamp,
            leaf: public_attestation_leaf(hasher, &fe(5), EntityType::RobotService, &fe(9), &timestamp, attestation_id),
        }
    }

    fn reopen(store: Arc<MemoryStore>) -> Result<PublicTrustRegistry, RegistryError> {
        let clock = Arc::new(FixedClock::new(Timestamp::parse("2026-04-02T00:00:00Z").unwrap()));
        PublicTrustRegistry::open(store, Arc::new(Sha256FieldHasher), clock, 4)
    }

    #[test]
    fn open_rejects_id_gap() {
        let store = Arc::new(MemoryStore::new());
        store.append_public_attestation(forged_row(0, &Sha256FieldHasher), None).unwrap();
        store.append_public_attestation(forged_row(2, &Sha256FieldHasher), None).unwrap();
        assert!(matches!(reopen(store), Err(RegistryError::Corruption(_))));
    }

    #[test]
    fn open_rejects_tampered_row() {
        let store = Arc::new(MemoryStore::new());
        store.append_public_attestation(forged_row(0, &Sha256FieldHasher), None).unwrap();
        assert!(reopen(store.clone()).is_ok());

        // Same leaf, different type: the leaf no longer matches its fields.
        let mut tampered = forged_row(1, &Sha256FieldHasher);
        tampered.entity_type = EntityType::HumanUser;
        store.append_public_attestation(tampered, None).unwrap();
        assert!(matches!(reopen(store), Err(RegistryError::Corruption(_))));
    }

    #[test]
    fn reopen_replays_same_root() {
        let (store, clock, registry) = setup(4);
        registry.add_attestation(fe(1), EntityType::HumanUser, fe(9)).unwrap();
        registry.add_attestation(fe(2), EntityType::HumanOperator, fe(9)).unwrap();
        let reopened =
            PublicTrustRegistry::open(store, Arc::new(Sha256FieldHasher), clock, 4).unwrap();
        assert_eq!(reopened.root(), registry.root());
        assert_eq!(reopened.count_for(&fe(2)), 1);
    }
}
