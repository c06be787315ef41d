//! # Storage Seams
//!
//! The registries own their in-memory state and write through to a
//! transactional store. The traits here are the whole contract a storage
//! engine must satisfy:
//!
//! - [`RegistryStore::commit`] applies rows, the root snapshot and the audit
//!   entry all-or-nothing. An `Err` means nothing was written.
//! - [`PublicTrustStore::append_public_attestation`] writes the attestation
//!   and its audit entry all-or-nothing.
//! - [`NullifierStore::insert_if_absent`] is an atomic check-and-insert.
//!
//! [`crate::MemoryStore`] implements all three traits.

use serde::{Deserialize, Serialize};
use typeproof_core::{FieldElement, Timestamp};

use crate::attester::AttesterRecord;
use crate::audit::AuditEntry;
use crate::error::StorageError;
use crate::nullifier::NullifierRecord;
use crate::public_trust::PublicAttestation;

/// A version of the attester root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSnapshot {
    /// Merkle root over Active attesters.
    pub root: FieldElement,
    /// Incremented on every register and revoke. 0 is the empty genesis.
    pub version: u64,
    /// Number of Active attesters under this root.
    pub active_count: u64,
    /// When this version was committed.
    pub updated_at: Timestamp,
}

/// One atomic registry write.
#[derive(Debug, Clone)]
pub struct RegistryCommit {
    /// Rows to insert or overwrite, keyed by attester id.
    pub upserts: Vec<AttesterRecord>,
    /// The new durable root.
    pub root: RootSnapshot,
    /// The audit entry describing the change.
    pub audit: AuditEntry,
}

/// Durable attester rows, root snapshots and audit entries.
pub trait RegistryStore: Send + Sync + std::fmt::Debug {
    /// Every stored attester row, in any order.
    fn load_attesters(&self) -> Result<Vec<AttesterRecord>, StorageError>;

    /// The current durable root, if one was ever committed.
    fn load_root(&self) -> Result<Option<RootSnapshot>, StorageError>;

    /// Every committed root snapshot, oldest first.
    fn load_root_history(&self) -> Result<Vec<RootSnapshot>, StorageError>;

    /// Every audit entry, oldest first.
    fn load_audit(&self) -> Result<Vec<AuditEntry>, StorageError>;

    /// Apply a registry mutation atomically.
    fn commit(&self, commit: RegistryCommit) -> Result<(), StorageError>;

    /// Append an audit entry that accompanies no state change.
    fn append_audit(&self, entry: AuditEntry) -> Result<(), StorageError>;
}

/// Durable public attestations.
pub trait PublicTrustStore: Send + Sync + std::fmt::Debug {
    /// Every stored attestation, in id order.
    fn load_public_attestations(&self) -> Result<Vec<PublicAttestation>, StorageError>;

    /// Append one attestation and, when given, its audit entry in the same
    /// write. An `Err` means neither was written.
    ///
    /// A backend that also implements [`RegistryStore`] returns the entry
    /// from [`RegistryStore::load_audit`] afterwards.
    fn append_public_attestation(
        &self,
        attestation: PublicAttestation,
        audit: Option<AuditEntry>,
    ) -> Result<(), StorageError>;
}

/// Durable consumed nullifiers.
pub trait NullifierStore: Send + Sync + std::fmt::Debug {
    /// The consumption record, if any.
    fn get_nullifier(&self, nullifier: &FieldElement) -> Result<Option<NullifierRecord>, StorageError>;

    /// Insert iff absent. `Ok(false)` when the nullifier was already present.
    fn insert_if_absent(&self, record: NullifierRecord) -> Result<bool, StorageError>;

    /// Number of consumed nullifiers.
    fn nullifier_count(&self) -> Result<u64, StorageError>;
}
