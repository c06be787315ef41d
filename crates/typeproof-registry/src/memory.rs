//! # In-Memory Store
//!
//! Thread-safe implementation of every storage trait, for tests and
//! single-process deployments. Each registry commit runs under one
//! `parking_lot` write lock, which makes it atomic with respect to readers.
//! Nullifiers live in a `DashMap` and are inserted through the entry API.
//!
//! ## Fault Injection
//!
//! [`MemoryStore::fail_next_commit`] makes the next registry commit or
//! public append fail without writing, and [`MemoryStore::overwrite_root`]
//! replaces the durable root behind the registry's back. Both exist so the
//! atomicity and corruption-detection paths can be exercised.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use typeproof_core::{AttesterId, FieldElement};

use crate::attester::AttesterRecord;
use crate::audit::AuditEntry;
use crate::error::StorageError;
use crate::nullifier::NullifierRecord;
use crate::public_trust::PublicAttestation;
use crate::storage::{NullifierStore, PublicTrustStore, RegistryCommit, RegistryStore, RootSnapshot};

#[derive(Debug, Default)]
struct RegistryTables {
    attesters: BTreeMap<AttesterId, AttesterRecord>,
    root: Option<RootSnapshot>,
    root_history: Vec<RootSnapshot>,
    audit: Vec<AuditEntry>,
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    registry: RwLock<RegistryTables>,
    public: RwLock<Vec<PublicAttestation>>,
    nullifiers: DashMap<FieldElement, NullifierRecord>,
    fail_next: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit or append fail with nothing written.
    pub fn fail_next_commit(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Replace the durable root without touching rows.
    pub fn overwrite_root(&self, snapshot: RootSnapshot) {
        self.registry.write().root = Some(snapshot);
    }

    /// Number of stored audit entries.
    pub fn audit_len(&self) -> usize {
        self.registry.read().audit.len()
    }

    fn take_injected_failure(&self) -> Result<(), StorageError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Backend("injected commit failure".to_string()));
        }
        Ok(())
    }
}

impl RegistryStore for MemoryStore {
    fn load_attesters(&self) -> Result<Vec<AttesterRecord>, StorageError> {
        Ok(self.registry.read().attesters.values().cloned().collect())
    }

    fn load_root(&self) -> Result<Option<RootSnapshot>, StorageError> {
        Ok(self.registry.read().root)
    }

    fn load_root_history(&self) -> Result<Vec<RootSnapshot>, StorageError> {
        Ok(self.registry.read().root_history.clone())
    }

    fn load_audit(&self) -> Result<Vec<AuditEntry>, StorageError> {
        Ok(self.registry.read().audit.clone())
    }

    fn commit(&self, commit: RegistryCommit) -> Result<(), StorageError> {
        let mut tables = self.registry.write();
        self.take_injected_failure()?;
        for row in commit.upserts {
            tables.attesters.insert(row.id.clone(), row);
        }
        tables.root = Some(commit.root);
        tables.root_history.push(commit.root);
        tables.audit.push(commit.audit);
        Ok(())
    }

    fn append_audit(&self, entry: AuditEntry) -> Result<(), StorageError> {
        let mut tables = self.registry.write();
        self.take_injected_failure()?;
        tables.audit.push(entry);
        Ok(())
    }
}

impl PublicTrustStore for MemoryStore {
    fn load_public_attestations(&self) -> Result<Vec<PublicAttestation>, StorageError> {
        Ok(self.public.read().clone())
    }

    fn append_public_attestation(
        &self,
        attestation: PublicAttestation,
        audit: Option<AuditEntry>,
    ) -> Result<(), StorageError> {
        // Lock order: registry tables, then public rows.
        let mut tables = self.registry.write();
        let mut rows = self.public.write();
        self.take_injected_failure()?;
        rows.push(attestation);
        if let Some(entry) = audit {
            tables.audit.push(entry);
        }
        Ok(())
    }
}

impl NullifierStore for MemoryStore {
    fn get_nullifier(&self, nullifier: &FieldElement) -> Result<Option<NullifierRecord>, StorageError> {
        Ok(self.nullifiers.get(nullifier).map(|r| r.value().clone()))
    }

    fn insert_if_absent(&self, record: NullifierRecord) -> Result<bool, StorageError> {
        match self.nullifiers.entry(record.nullifier) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    fn nullifier_count(&self) -> Result<u64, StorageError> {
        Ok(self.nullifiers.len() as u64)
    }
}
