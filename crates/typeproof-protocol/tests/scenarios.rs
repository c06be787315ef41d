//! End-to-end flows through the node facade: attester lifecycle, issuance,
//! entity-side proof construction with the mock prover, verification,
//! consumption and policy evaluation.

use std::sync::Arc;

use typeproof_core::{EntityType, ErrorKind, FieldElement, FixedClock, Timestamp};
use typeproof_crypto::{derive_commitment, derive_nullifier, FieldHasher, Sha256FieldHasher};
use typeproof_protocol::{
    Capabilities, InteractionLevel, ProtocolConfig, ProtocolError, Stores, TypeproofNode,
    VerificationPackage, VerificationPolicy, ZkEvidence,
};
use typeproof_registry::{MemoryStore, NullifierStatus, RegistryError};
use typeproof_zkp::{MockProofSystem, Proof, PublicSignals};

const DEPTH: u32 = 4;

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    node: TypeproofNode,
}

fn config() -> ProtocolConfig {
    ProtocolConfig {
        attester_tree_depth: DEPTH,
        public_tree_depth: 6,
        ..ProtocolConfig::default()
    }
}

fn open(store: &Arc<MemoryStore>, clock: &Arc<FixedClock>) -> Result<TypeproofNode, ProtocolError> {
    let config = config();
    let caps = Capabilities::reference(&config.verification_key_id, clock.clone());
    TypeproofNode::open(config, caps, Stores::memory(store.clone()))
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(Timestamp::parse("2026-09-01T10:00:00Z").unwrap()));
    let node = open(&store, &clock).unwrap();
    Harness { store, clock, node }
}

/// What an entity does off-node: derive its commitment and nullifier, then
/// prove against the current root.
struct Entity {
    secret: FieldElement,
    commitment: FieldElement,
}

impl Entity {
    fn new(secret: u64) -> Self {
        let secret = FieldElement::from_u64(secret);
        let commitment = derive_commitment(&Sha256FieldHasher, &secret, &FieldElement::from_u64(1));
        Self { secret, commitment }
    }

    fn prove(&self, node: &TypeproofNode, entity_type: EntityType, context: u64) -> (Proof, PublicSignals) {
        let context_id = FieldElement::from_u64(context);
        let signals = PublicSignals {
            nullifier: derive_nullifier(&Sha256FieldHasher, &self.secret, &context_id),
            entity_commitment: self.commitment,
            claimed_type: entity_type.to_field(),
            attesters_root: node.current_root().root,
            context_id,
        };
        let proof = MockProofSystem::prove(node.gateway().verification_key(), &signals);
        (proof, signals)
    }
}

fn strings(signals: &PublicSignals) -> Vec<String> {
    signals.to_array().iter().map(|e| e.to_hex()).collect()
}

#[test]
fn attest_within_and_outside_allowed_types() {
    let h = harness();
    let (_, cred) = h.node.register_attester("a", "Lab A", &["AI.CA"]).unwrap();
    let att = h.node.attest(&cred, FieldElement::from_u64(7), "AI.CA").unwrap();
    assert_eq!(att.merkle_proof.path.len(), DEPTH as usize);
    assert!(att.merkle_proof.verify(&h.node.current_root().root, &Sha256FieldHasher));

    let err = h.node.attest(&cred, FieldElement::from_u64(7), "HU.US").unwrap_err();
    assert!(matches!(err, ProtocolError::Forbidden { .. }));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn revoking_sole_attester_restores_empty_root() {
    let h = harness();
    let empty = h.node.current_root().root;
    h.node.register_attester("a", "Lab A", &["AI.CA"]).unwrap();
    let old = h.node.attester_proof("a").unwrap();
    let snap = h.node.revoke_attester("a").unwrap();
    assert_eq!(snap.root, empty);
    assert!(!old.proof.verify(&snap.root, &Sha256FieldHasher));
    assert_eq!(h.node.attester_proof("a").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn revocation_reindexes_survivors_densely() {
    let h = harness();
    for id in ["a", "b", "c"] {
        h.node.register_attester(id, "Lab", &["HU.US"]).unwrap();
    }
    h.node.revoke_attester("a").unwrap();
    assert_eq!(h.node.attester_proof("b").unwrap().merkle_index, 0);
    assert_eq!(h.node.attester_proof("c").unwrap().merkle_index, 1);
}

#[test]
fn verify_twice_around_consumption() {
    let h = harness();
    h.node.register_attester("a", "Lab A", &["HU.VR"]).unwrap();
    let entity = Entity::new(1234);
    let (proof, signals) = entity.prove(&h.node, EntityType::HumanVerified, 55);

    let first = h.node.verify(&proof, &strings(&signals)).unwrap();
    assert_eq!(first.nullifier_status, NullifierStatus::Unused);
    assert_eq!(first.entity_type, EntityType::HumanVerified);

    h.node
        .record_consumption(signals.nullifier, signals.context_id, "forum.example")
        .unwrap();
    let second = h.node.verify(&proof, &strings(&signals)).unwrap();
    assert_eq!(second.nullifier_status, NullifierStatus::Used);

    let err = h
        .node
        .record_consumption(signals.nullifier, signals.context_id, "forum.example")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::NullifierUsed(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn stale_root_is_rejected_even_when_proof_is_valid() {
    let h = harness();
    h.node.register_attester("a", "Lab A", &["HU.VR"]).unwrap();
    let entity = Entity::new(9);
    let (proof, signals) = entity.prove(&h.node, EntityType::HumanVerified, 1);
    h.node.register_attester("b", "Lab B", &["HU.VR"]).unwrap();
    let err = h.node.verify(&proof, &strings(&signals)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Staleness);
    assert!(!err.kind().is_retryable());

    // A fresh proof against the new root passes.
    let (proof, signals) = entity.prove(&h.node, EntityType::HumanVerified, 1);
    assert!(h.node.verify(&proof, &strings(&signals)).unwrap().valid);
}

#[test]
fn standing_requires_public_attestations_inclusively() {
    let h = harness();
    let (_, cred) = h.node.register_attester("a", "Lab A", &["RB.SV"]).unwrap();
    let entity = Entity::new(77);
    let policy = VerificationPolicy::at_least(InteractionLevel::TypeOnly)
        .allow_types([EntityType::RobotService])
        .require_public_attestations(2);

    h.node.publish(&cred, entity.commitment, "RB.SV").unwrap();
    let (proof, signals) = entity.prove(&h.node, EntityType::RobotService, 3);
    let package = VerificationPackage {
        entity_commitment: entity.commitment,
        zk: Some(ZkEvidence {
            proof,
            public_signals: signals,
        }),
    };
    let below = h.node.evaluate(&policy, InteractionLevel::TypeWithStanding, &package);
    assert!(!below.valid);
    assert_eq!(below.reasons.len(), 1);

    h.node.publish(&cred, entity.commitment, "RB.SV").unwrap();
    let at = h.node.evaluate(&policy, InteractionLevel::TypeWithStanding, &package);
    assert!(at.valid, "{:?}", at.reasons);
    assert!(h.node.is_fresh(&entity.commitment, &at.trust_hash));

    h.node.publish(&cred, entity.commitment, "RB.SV").unwrap();
    assert!(!h.node.is_fresh(&entity.commitment, &at.trust_hash));

    let full = h.node.evaluate(&policy, InteractionLevel::FullAccountability, &package);
    assert_eq!(full.disclosed_attestations.map(|d| d.len()), Some(3));
}

#[test]
fn max_attestation_age_uses_node_clock() {
    let h = harness();
    let (_, cred) = h.node.register_attester("a", "Lab A", &["HU.US"]).unwrap();
    let entity = Entity::new(5);
    h.node.publish(&cred, entity.commitment, "HU.US").unwrap();
    let policy = VerificationPolicy::default().require_public_attestations(1).max_age_secs(86_400);
    let (proof, signals) = entity.prove(&h.node, EntityType::HumanUser, 2);
    let package = VerificationPackage {
        entity_commitment: entity.commitment,
        zk: Some(ZkEvidence {
            proof,
            public_signals: signals,
        }),
    };
    assert!(h.node.evaluate(&policy, InteractionLevel::TypeWithStanding, &package).valid);
    h.clock.advance_secs(86_401);
    let outcome = h.node.evaluate(&policy, InteractionLevel::TypeWithStanding, &package);
    assert_eq!(outcome.reasons.len(), 1);
    assert_eq!(outcome.reasons[0].code(), "stale_attestations");
}

#[test]
fn failed_commit_leaves_registry_unchanged() {
    let h = harness();
    h.node.register_attester("a", "Lab A", &["HU.US"]).unwrap();
    let before = h.node.current_root();
    h.store.fail_next_commit();
    let err = h.node.register_attester("b", "Lab B", &["HU.US"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.node.current_root(), before);
    assert_eq!(h.node.list_attesters().len(), 1);
}

#[test]
fn restart_replays_state_and_detects_tampering() {
    let h = harness();
    h.node.register_attester("a", "Lab A", &["HU.US"]).unwrap();
    h.node.register_attester("b", "Lab B", &["HU.US"]).unwrap();
    h.node.revoke_attester("a").unwrap();
    let before = h.node.current_root();

    let restarted = open(&h.store, &h.clock).unwrap();
    assert_eq!(restarted.current_root(), before);

    let mut forged = before;
    forged.root = Sha256FieldHasher.hash(&[FieldElement::from_u64(1)]);
    h.store.overwrite_root(forged);
    let err = open(&h.store, &h.clock).unwrap_err();
    assert!(matches!(err, ProtocolError::Registry(RegistryError::Corruption(_))));
}

#[test]
fn concurrent_consumption_has_one_winner() {
    let h = harness();
    h.node.register_attester("a", "Lab A", &["HU.US"]).unwrap();
    let entity = Entity::new(31);
    let (proof, signals) = entity.prove(&h.node, EntityType::HumanUser, 8);
    let raw = strings(&signals);
    let results: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let node = &h.node;
                let proof = &proof;
                let raw = &raw;
                s.spawn(move || node.verify_and_consume(proof, raw, "race").is_ok())
            })
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
}
