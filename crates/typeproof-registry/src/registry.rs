//! # Attester Registry
//!
//! Lifecycle of the authorities allowed to vouch for entity types, on top of
//! an [`IncrementalMerkleTree`] whose leaves are `hash(pubkey.x, pubkey.y)`
//! of every Active attester.
//!
//! ## Security Invariant
//!
//! - Active attesters occupy indices `0..n` in registration order, with no
//!   gaps, after every completed mutation.
//! - The durable root equals a fresh replay of the stored Active rows in
//!   stored index order. [`AttesterRegistry::open`] checks this and refuses
//!   to start on a mismatch.
//! - Every mutation stages its changes on a copy, commits rows, root and
//!   audit entry to the store in one call, and swaps the copy in only after
//!   the commit succeeds. A failed commit leaves the registry untouched.
//! - All mutations hold the one write lock from staging to swap, so readers
//!   never observe a half-reindexed tree.
//!
//! ## Revocation
//!
//! Revoking reindexes every survivor. Attesters whose index moved must fetch
//! a fresh proof through [`AttesterRegistry::proof_for`]; their old proofs
//! fold to a superseded root and the gateway rejects them as stale.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use serde_json::json;
use typeproof_core::{AttesterId, Clock, EntityType, FieldElement, ValidationError};
use typeproof_crypto::{
    Credential, CryptoError, FieldHasher, IncrementalMerkleTree, MerkleProof, PublicKey, Signature,
    SignatureScheme,
};

use crate::attester::{Attester, AttesterRecord, AttesterStatus};
use crate::audit::{AuditAction, AuditEntry};
use crate::error::RegistryError;
use crate::storage::{RegistryCommit, RegistryStore, RootSnapshot};

/// A membership proof together with the root it was taken against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttesterProof {
    /// The attester.
    pub attester_id: AttesterId,
    /// Current leaf index.
    pub merkle_index: u64,
    /// Inclusion proof.
    pub proof: MerkleProof,
    /// The root the proof folds to.
    pub root: RootSnapshot,
}

struct RegistryState {
    attesters: BTreeMap<AttesterId, AttesterRecord>,
    tree: IncrementalMerkleTree,
    snapshot: RootSnapshot,
    history: Vec<RootSnapshot>,
    audit: Vec<AuditEntry>,
    next_seq: u64,
}

impl RegistryState {
    fn active_in_order(&self) -> Vec<&AttesterRecord> {
        let mut active: Vec<&AttesterRecord> =
            self.attesters.values().filter(|r| r.is_active()).collect();
        active.sort_by_key(|r| r.registration_seq);
        active
    }

    fn proof_for(&self, id: &AttesterId) -> Result<AttesterProof, RegistryError> {
        let record = self
            .attesters
            .get(id)
            .filter(|r| r.is_active())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let index = record
            .merkle_index
            .ok_or_else(|| RegistryError::Corruption(format!("active attester {id} has no index")))?;
        Ok(AttesterProof {
            attester_id: id.clone(),
            merkle_index: index,
            proof: self.tree.proof(index)?,
            root: self.snapshot,
        })
    }
}

/// Registry of attesters.
pub struct AttesterRegistry {
    store: Arc<dyn RegistryStore>,
    hasher: Arc<dyn FieldHasher>,
    signer: Arc<dyn SignatureScheme>,
    clock: Arc<dyn Clock>,
    state: RwLock<RegistryState>,
}

impl AttesterRegistry {
    /// Open over `store`, replaying Active attesters into a tree of `depth`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Corruption`] if Active indices are not dense from
    ///   0, or if the replayed root or active count differs from the stored
    ///   root snapshot.
    /// - [`RegistryError::Merkle`] for an invalid depth or a stored set
    ///   larger than capacity.
    pub fn open(
        store: Arc<dyn RegistryStore>,
        hasher: Arc<dyn FieldHasher>,
        signer: Arc<dyn SignatureScheme>,
        clock: Arc<dyn Clock>,
        depth: u32,
    ) -> Result<Self, RegistryError> {
        let rows = store.load_attesters()?;
        let mut attesters = BTreeMap::new();
        let mut active: Vec<(u64, FieldElement)> = Vec::new();
        let mut next_seq = 0;
        for row in rows {
            next_seq = next_seq.max(row.registration_seq + 1);
            match (row.status, row.merkle_index) {
                (AttesterStatus::Active, Some(index)) => active.push((index, row.leaf(hasher.as_ref()))),
                (AttesterStatus::Active, None) => {
                    return Err(RegistryError::Corruption(format!(
                        "active attester {} has no index",
                        row.id
                    )))
                }
                (AttesterStatus::Revoked, Some(_)) => {
                    return Err(RegistryError::Corruption(format!(
                        "revoked attester {} still holds an index",
                        row.id
                    )))
                }
                (AttesterStatus::Revoked, None) => {}
            }
            attesters.insert(row.id.clone(), row);
        }

        active.sort_by_key(|(index, _)| *index);
        if let Some(position) = active
            .iter()
            .enumerate()
            .position(|(expected, (index, _))| *index != expected as u64)
        {
            return Err(RegistryError::Corruption(format!(
                "active indices are not dense: gap at position {position}"
            )));
        }
        let leaves: Vec<FieldElement> = active.into_iter().map(|(_, leaf)| leaf).collect();
        let tree = IncrementalMerkleTree::from_leaves(depth, hasher.clone(), &leaves)?;

        let snapshot = match store.load_root()? {
            Some(stored) => {
                if stored.root != tree.root() || stored.active_count != tree.len() {
                    tracing::warn!(
                        stored_root = %stored.root,
                        replayed_root = %tree.root(),
                        stored_count = stored.active_count,
                        replayed_count = tree.len(),
                        "attester root replay mismatch"
                    );
                    return Err(RegistryError::Corruption(format!(
                        "stored root {} (version {}) does not match replayed root {}",
                        stored.root,
                        stored.version,
                        tree.root()
                    )));
                }
                stored
            }
            None if !tree.is_empty() => {
                return Err(RegistryError::Corruption(
                    "active attesters stored without a root snapshot".to_string(),
                ))
            }
            None => RootSnapshot {
                root: tree.root(),
                version: 0,
                active_count: 0,
                updated_at: clock.now(),
            },
        };

        let history = store.load_root_history()?;
        let audit = store.load_audit()?;
        tracing::info!(
            attesters = attesters.len(),
            active = tree.len(),
            root = %snapshot.root,
            version = snapshot.version,
            "attester registry opened"
        );
        Ok(Self {
            store,
            hasher,
            signer,
            clock,
            state: RwLock::new(RegistryState {
                attesters,
                tree,
                snapshot,
                history,
                audit,
                next_seq,
            }),
        })
    }

    /// Register a new attester.
    ///
    /// Returns the public view and the plaintext credential. The credential
    /// is not recoverable afterwards.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Validation`] for a blank name or an empty type set.
    /// - [`RegistryError::AlreadyExists`] if `id` was ever registered.
    /// - [`RegistryError::Merkle`] with `TreeFull` at capacity.
    /// - [`RegistryError::Storage`] if the commit fails; nothing changes.
    pub fn register(
        &self,
        id: AttesterId,
        name: &str,
        allowed_types: impl IntoIterator<Item = EntityType>,
    ) -> Result<(Attester, Credential), RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        let allowed_types: BTreeSet<EntityType> = allowed_types.into_iter().collect();
        if allowed_types.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "allowed_types",
            }
            .into());
        }

        let mut state = self.state.write();
        if state.attesters.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }

        let keypair = self.signer.generate()?;
        let credential = Credential::generate()?;
        let now = self.clock.now();

        let mut tree = state.tree.clone();
        let index = tree.add_leaf(keypair.public.leaf(self.hasher.as_ref()))?;
        let record = AttesterRecord {
            id: id.clone(),
            name: name.to_string(),
            public_key: keypair.public,
            secret_key: keypair.secret,
            merkle_index: Some(index),
            allowed_types,
            credential_hash: credential.hash(),
            status: AttesterStatus::Active,
            registration_seq: state.next_seq,
            created_at: now,
            revoked_at: None,
        };
        let snapshot = RootSnapshot {
            root: tree.root(),
            version: state.snapshot.version + 1,
            active_count: tree.len(),
            updated_at: now,
        };
        let labels: Vec<&str> = record.allowed_types.iter().map(|t| t.as_str()).collect();
        let audit = AuditEntry::new(
            AuditAction::AttesterRegistered,
            id.as_str(),
            json!({
                "name": record.name,
                "merkle_index": index,
                "allowed_types": labels,
                "root": snapshot.root.to_hex(),
                "root_version": snapshot.version,
            }),
            now,
        );

        self.store.commit(RegistryCommit {
            upserts: vec![record.clone()],
            root: snapshot,
            audit: audit.clone(),
        })?;

        let view = record.view();
        state.attesters.insert(id.clone(), record);
        state.tree = tree;
        state.snapshot = snapshot;
        state.history.push(snapshot);
        state.audit.push(audit);
        state.next_seq += 1;
        tracing::info!(
            attester_id = %id,
            merkle_index = index,
            root = %snapshot.root,
            root_version = snapshot.version,
            "attester registered"
        );
        Ok((view, credential))
    }

    /// Revoke an attester and reindex every survivor.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if absent or already revoked.
    /// - [`RegistryError::Storage`] if the commit fails; nothing changes.
    pub fn revoke(&self, id: &AttesterId) -> Result<RootSnapshot, RegistryError> {
        let mut state = self.state.write();
        if !state.attesters.get(id).is_some_and(AttesterRecord::is_active) {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        let now = self.clock.now();

        let mut attesters = state.attesters.clone();
        if let Some(revoked) = attesters.get_mut(id) {
            revoked.status = AttesterStatus::Revoked;
            revoked.revoked_at = Some(now);
            revoked.merkle_index = None;
        }

        let mut survivors: Vec<(u64, AttesterId)> = attesters
            .values()
            .filter(|r| r.is_active())
            .map(|r| (r.registration_seq, r.id.clone()))
            .collect();
        survivors.sort();
        let leaves: Vec<FieldElement> = survivors
            .iter()
            .filter_map(|(_, sid)| attesters.get(sid).map(|r| r.leaf(self.hasher.as_ref())))
            .collect();
        let mut tree = state.tree.clone();
        let indices = tree.remove_and_reindex(&leaves)?;

        let mut upserts = Vec::with_capacity(survivors.len() + 1);
        for ((_, sid), index) in survivors.iter().zip(indices) {
            if let Some(row) = attesters.get_mut(sid) {
                row.merkle_index = Some(index);
                upserts.push(row.clone());
            }
        }
        if let Some(revoked) = attesters.get(id) {
            upserts.push(revoked.clone());
        }

        let snapshot = RootSnapshot {
            root: tree.root(),
            version: state.snapshot.version + 1,
            active_count: tree.len(),
            updated_at: now,
        };
        let audit = AuditEntry::new(
            AuditAction::AttesterRevoked,
            id.as_str(),
            json!({
                "survivors_reindexed": survivors.len(),
                "root": snapshot.root.to_hex(),
                "root_version": snapshot.version,
            }),
            now,
        );

        self.store.commit(RegistryCommit {
            upserts,
            root: snapshot,
            audit: audit.clone(),
        })?;

        state.attesters = attesters;
        state.tree = tree;
        state.snapshot = snapshot;
        state.history.push(snapshot);
        state.audit.push(audit);
        tracing::info!(
            attester_id = %id,
            survivors = survivors.len(),
            root = %snapshot.root,
            root_version = snapshot.version,
            "attester revoked"
        );
        Ok(snapshot)
    }

    /// Current membership proof for an Active attester.
    pub fn proof_for(&self, id: &AttesterId) -> Result<AttesterProof, RegistryError> {
        self.state.read().proof_for(id)
    }

    /// Current attester root.
    pub fn current_root(&self) -> FieldElement {
        self.state.read().snapshot.root
    }

    /// Current root with its version.
    pub fn root_snapshot(&self) -> RootSnapshot {
        self.state.read().snapshot
    }

    /// Every committed root, oldest first.
    pub fn root_history(&self) -> Vec<RootSnapshot> {
        self.state.read().history.clone()
    }

    /// Whether `root` was ever committed, including the current one.
    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        let state = self.state.read();
        state.snapshot.root == *root || state.history.iter().any(|s| s.root == *root)
    }

    /// All attesters, in registration order.
    pub fn list_attesters(&self) -> Vec<Attester> {
        let state = self.state.read();
        let mut records: Vec<&AttesterRecord> = state.attesters.values().collect();
        records.sort_by_key(|r| r.registration_seq);
        records.into_iter().map(AttesterRecord::view).collect()
    }

    /// Active attesters, in index order.
    pub fn active_attesters(&self) -> Vec<Attester> {
        self.state
            .read()
            .active_in_order()
            .into_iter()
            .map(AttesterRecord::view)
            .collect()
    }

    /// One attester by id.
    pub fn get(&self, id: &AttesterId) -> Option<Attester> {
        self.state.read().attesters.get(id).map(AttesterRecord::view)
    }

    /// Every audit entry, oldest first.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.state.read().audit.clone()
    }

    /// Persist an audit entry that accompanies no registry mutation.
    pub fn append_audit(&self, entry: AuditEntry) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        self.store.append_audit(entry.clone())?;
        state.audit.push(entry);
        Ok(())
    }

    /// Add to the in-memory log an entry another store write already made
    /// durable, such as the one from
    /// [`crate::PublicTrustRegistry::add_audited_attestation`].
    pub fn mirror_audit(&self, entry: AuditEntry) {
        self.state.write().audit.push(entry);
    }

    /// Resolve a bearer credential to an Active attester.
    ///
    /// The returned session holds the read lock, so the attester's key,
    /// proof and the root it reports all come from one registry version.
    /// Drop the session before calling any mutating method.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] for an unknown or revoked credential.
    pub fn resolve_credential(&self, credential: &Credential) -> Result<AttesterSession<'_>, RegistryError> {
        let presented = credential.hash();
        let state = self.state.read();
        // Compare against every row so timing does not depend on position.
        let matched = state
            .attesters
            .values()
            .fold(None, |found, r| {
                if r.credential_hash.ct_matches(&presented) {
                    Some(r.id.clone())
                } else {
                    found
                }
            });
        let id = match matched {
            Some(id) if state.attesters.get(&id).is_some_and(AttesterRecord::is_active) => id,
            Some(id) => {
                tracing::warn!(attester_id = %id, "credential of revoked attester presented");
                return Err(RegistryError::Unauthorized);
            }
            None => return Err(RegistryError::Unauthorized),
        };
        Ok(AttesterSession {
            state,
            id,
            signer: self.signer.as_ref(),
        })
    }

    /// The hasher leaves are built with.
    pub fn hasher(&self) -> &Arc<dyn FieldHasher> {
        &self.hasher
    }

    /// The signature scheme attesters sign with.
    pub fn signer(&self) -> &Arc<dyn SignatureScheme> {
        &self.signer
    }

    /// Tree depth.
    pub fn depth(&self) -> u32 {
        self.state.read().tree.depth()
    }
}

impl std::fmt::Debug for AttesterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("AttesterRegistry")
            .field("attesters", &state.attesters.len())
            .field("active", &state.tree.len())
            .field("root", &state.snapshot.root)
            .field("version", &state.snapshot.version)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AttesterSession
// ---------------------------------------------------------------------------

/// An authenticated attester, pinned to one registry version.
pub struct AttesterSession<'a> {
    state: RwLockReadGuard<'a, RegistryState>,
    id: AttesterId,
    signer: &'a dyn SignatureScheme,
}

impl AttesterSession<'_> {
    fn record(&self) -> Result<&AttesterRecord, RegistryError> {
        self.state
            .attesters
            .get(&self.id)
            .ok_or_else(|| RegistryError::NotFound(self.id.to_string()))
    }

    /// The attester id.
    pub fn attester_id(&self) -> &AttesterId {
        &self.id
    }

    /// Public view of the attester.
    pub fn attester(&self) -> Result<Attester, RegistryError> {
        Ok(self.record()?.view())
    }

    /// Whether the attester may vouch for `entity_type`.
    pub fn allows(&self, entity_type: EntityType) -> bool {
        self.record().is_ok_and(|r| r.allows(entity_type))
    }

    /// The attester's public key.
    pub fn public_key(&self) -> Result<PublicKey, RegistryError> {
        Ok(self.record()?.public_key)
    }

    /// Sign `message` with the attester's key.
    pub fn sign(&self, message: &FieldElement) -> Result<Signature, CryptoError> {
        let record = self
            .record()
            .map_err(|e| CryptoError::KeyError(e.to_string()))?;
        self.signer.sign(&record.secret_key, message)
    }

    /// Membership proof and root, from the pinned version.
    pub fn proof(&self) -> Result<AttesterProof, RegistryError> {
        self.state.proof_for(&self.id)
    }
}

impl std::fmt::Debug for AttesterSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttesterSession")
            .field("attester_id", &self.id)
            .field("root_version", &self.state.snapshot.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use typeproof_core::{FixedClock, Timestamp};
    use typeproof_crypto::{Ed25519Scheme, Sha256FieldHasher};

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        registry: AttesterRegistry,
    }

    fn fixture(depth: u32) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(Timestamp::parse("2026-01-10T09:00:00Z").unwrap()));
        let registry = open(&store, &clock, depth).unwrap();
        Fixture {
            store,
            clock,
            registry,
        }
    }

    fn open(store: &Arc<MemoryStore>, clock: &Arc<FixedClock>, depth: u32) -> Result<AttesterRegistry, RegistryError> {
        AttesterRegistry::open(
            store.clone(),
            Arc::new(Sha256FieldHasher),
            Arc::new(Ed25519Scheme),
            clock.clone(),
            depth,
        )
    }

    fn id(s: &str) -> AttesterId {
        AttesterId::new(s).unwrap()
    }

    #[test]
    fn empty_registry_has_empty_root() {
        let f = fixture(4);
        let empty = IncrementalMerkleTree::new(4, Arc::new(Sha256FieldHasher)).unwrap();
        assert_eq!(f.registry.current_root(), empty.root());
        assert_eq!(f.registry.root_snapshot().version, 0);
        assert!(f.registry.list_attesters().is_empty());
    }

    #[test]
    fn register_assigns_dense_indices_and_versions() {
        let f = fixture(4);
        for (n, name) in ["a", "b", "c"].iter().enumerate() {
            let (att, cred) = f
                .registry
                .register(id(name), "Lab", [EntityType::AiConversationalAgent])
                .unwrap();
            assert_eq!(att.merkle_index, Some(n as u64));
            assert!(cred.expose().starts_with("tpa_"));
        }
        let snap = f.registry.root_snapshot();
        assert_eq!(snap.version, 3);
        assert_eq!(snap.active_count, 3);
        assert_eq!(f.registry.root_history().len(), 3);
        assert_eq!(f.registry.audit_log().len(), 3);
        let proof = f.registry.proof_for(&id("b")).unwrap();
        assert_eq!(proof.proof.path.len(), 4);
        assert!(proof.proof.verify(&snap.root, &Sha256FieldHasher));
    }

    #[test]
    fn register_validation() {
        let f = fixture(4);
        assert!(matches!(
            f.registry.register(id("a"), "  ", [EntityType::HumanUser]),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            f.registry.register(id("a"), "Lab", []),
            Err(RegistryError::Validation(_))
        ));
        f.registry.register(id("a"), "Lab", [EntityType::HumanUser]).unwrap();
        assert!(matches!(
            f.registry.register(id("a"), "Lab", [EntityType::HumanUser]),
            Err(RegistryError::AlreadyExists(_))
        ));
    }

    #[test]
    fn revoked_ids_are_never_reused() {
        let f = fixture(4);
        f.registry.register(id("a"), "Lab", [EntityType::HumanUser]).unwrap();
        f.registry.revoke(&id("a")).unwrap();
        assert!(matches!(
            f.registry.register(id("a"), "Lab", [EntityType::HumanUser]),
            Err(RegistryError::AlreadyExists(_))
        ));
        assert!(matches!(f.registry.revoke(&id("a")), Err(RegistryError::NotFound(_))));
        assert!(matches!(f.registry.revoke(&id("zz")), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn revoke_reindexes_survivors_in_registration_order() {
        let f = fixture(4);
        for name in ["a", "b", "c", "d"] {
            f.registry.register(id(name), "Lab", [EntityType::HumanUser]).unwrap();
        }
        let before = f.registry.current_root();
        let old_c = f.registry.proof_for(&id("c")).unwrap();
        let snap = f.registry.revoke(&id("b")).unwrap();
        assert_ne!(snap.root, before);
        assert_eq!(snap.active_count, 3);
        let indices: Vec<(String, Option<u64>)> = f
            .registry
            .list_attesters()
            .into_iter()
            .map(|a| (a.id.to_string(), a.merkle_index))
            .collect();
        assert_eq!(
            indices,
            vec![
                ("a".to_string(), Some(0)),
                ("b".to_string(), None),
                ("c".to_string(), Some(1)),
                ("d".to_string(), Some(2)),
            ]
        );
        assert!(matches!(f.registry.proof_for(&id("b")), Err(RegistryError::NotFound(_))));
        assert!(!old_c.proof.verify(&snap.root, &Sha256FieldHasher));
        let fresh_c = f.registry.proof_for(&id("c")).unwrap();
        assert!(fresh_c.proof.verify(&snap.root, &Sha256FieldHasher));
        assert_eq!(f.registry.get(&id("b")).unwrap().status, AttesterStatus::Revoked);
        assert!(f.registry.is_known_root(&before));
    }

    #[test]
    fn revoking_sole_attester_restores_empty_root() {
        let f = fixture(3);
        let empty = f.registry.current_root();
        f.registry.register(id("a"), "Lab", [EntityType::HumanUser]).unwrap();
        let cached = f.registry.proof_for(&id("a")).unwrap();
        let snap = f.registry.revoke(&id("a")).unwrap();
        assert_eq!(snap.root, empty);
        assert!(!cached.proof.verify(&snap.root, &Sha256FieldHasher));
    }

    #[test]
    fn failed_commit_leaves_state_unchanged() {
        let f = fixture(4);
        f.registry.register(id("a"), "Lab", [EntityType::HumanUser]).unwrap();
        let snap = f.registry.root_snapshot();
        f.store.fail_next_commit();
        assert!(matches!(
            f.registry.register(id("b"), "Lab", [EntityType::HumanUser]),
            Err(RegistryError::Storage(_))
        ));
        assert_eq!(f.registry.root_snapshot(), snap);
        assert!(f.registry.get(&id("b")).is_none());
        f.store.fail_next_commit();
        assert!(f.registry.revoke(&id("a")).is_err());
        assert_eq!(f.registry.root_snapshot(), snap);
        assert!(f.registry.proof_for(&id("a")).is_ok());
        assert_eq!(f.registry.audit_log().len(), 1);
        // The id is still free after the failed attempt.
        f.registry.register(id("b"), "Lab", [EntityType::HumanUser]).unwrap();
    }

    #[test]
    fn reopen_replays_to_same_root() {
        let f = fixture(4);
        for name in ["a", "b", "c"] {
            f.registry.register(id(name), "Lab", [EntityType::HumanUser]).unwrap();
        }
        f.registry.revoke(&id("a")).unwrap();
        let reopened = open(&f.store, &f.clock, 4).unwrap();
        assert_eq!(reopened.root_snapshot(), f.registry.root_snapshot());
        assert_eq!(reopened.root_history().len(), 4);
        assert_eq!(reopened.audit_log().len(), 4);
        assert_eq!(reopened.proof_for(&id("c")).unwrap().merkle_index, 1);
        // Sequence numbers continue after reopen.
        let (d, _) = reopened.register(id("d"), "Lab", [EntityType::HumanUser]).unwrap();
        assert_eq!(d.merkle_index, Some(2));
    }

    #[test]
    fn tampered_root_is_corruption() {
        let f = fixture(4);
        f.registry.register(id("a"), "Lab", [EntityType::HumanUser]).unwrap();
        let mut snap = f.registry.root_snapshot();
        snap.root = FieldElement::from_u64(12345);
        f.store.overwrite_root(snap);
        assert!(matches!(open(&f.store, &f.clock, 4), Err(RegistryError::Corruption(_))));
    }

    #[test]
    fn credential_resolution() {
        let f = fixture(4);
        let (_, cred) = f
            .registry
            .register(id("a"), "Lab", [EntityType::AiConversationalAgent])
            .unwrap();
        {
            let session = f.registry.resolve_credential(&cred).unwrap();
            assert_eq!(session.attester_id(), &id("a"));
            assert!(session.allows(EntityType::AiConversationalAgent));
            assert!(!session.allows(EntityType::HumanUser));
            let msg = FieldElement::from_u64(9);
            let sig = session.sign(&msg).unwrap();
            assert!(Ed25519Scheme.verify(&session.public_key().unwrap(), &msg, &sig));
        }
        assert!(matches!(
            f.registry.resolve_credential(&Credential::from_plaintext("tpa_bogus")),
            Err(RegistryError::Unauthorized)
        ));
        f.registry.revoke(&id("a")).unwrap();
        assert!(matches!(
            f.registry.resolve_credential(&cred),
            Err(RegistryError::Unauthorized)
        ));
    }

    #[test]
    fn concurrent_readers_see_consistent_proofs() {
        let f = fixture(5);
        for n in 0..8 {
            f.registry
                .register(id(&format!("att-{n}")), "Lab", [EntityType::HumanUser])
                .unwrap();
        }
        std::thread::scope(|s| {
            let registry = &f.registry;
            s.spawn(move || {
                for n in 0..4 {
                    registry.revoke(&id(&format!("att-{n}"))).unwrap();
                }
            });
            for _ in 0..4 {
                s.spawn(move || {
                    for _ in 0..50 {
                        if let Ok(p) = registry.proof_for(&id("att-7")) {
                            assert!(p.proof.verify(&p.root.root, &Sha256FieldHasher));
                        }
                    }
                });
            }
        });
        assert_eq!(f.registry.proof_for(&id("att-7")).unwrap().merkle_index, 3);
    }

    #[test]
    fn clock_drives_timestamps() {
        let f = fixture(4);
        f.clock.advance_secs(60);
        let (att, _) = f.registry.register(id("a"), "Lab", [EntityType::HumanUser]).unwrap();
        assert_eq!(att.created_at.to_iso8601(), "2026-01-10T09:01:00Z");
    }
}
