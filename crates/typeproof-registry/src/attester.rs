//! # Attester Records
//!
//! `AttesterRecord` is the stored row, including the signing secret and the
//! credential hash. `Attester` is the public view handed to callers and
//! serialized into responses; it carries neither.
//!
//! ## Lifecycle
//!
//! Active → Revoked. Terminal; records are never deleted, and a revoked id
//! is never reused. Only Active attesters occupy a Merkle index, and those
//! indices are dense from 0 in registration order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use typeproof_core::{AttesterId, EntityType, FieldElement, Timestamp};
use typeproof_crypto::{CredentialHash, FieldHasher, PublicKey, SecretKey};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttesterStatus {
    /// May sign; occupies a Merkle leaf.
    Active,
    /// Terminal. Holds no leaf.
    Revoked,
}

impl AttesterStatus {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for AttesterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored attester row.
#[derive(Debug, Clone)]
pub struct AttesterRecord {
    /// Unique id.
    pub id: AttesterId,
    /// Display name.
    pub name: String,
    /// Signing public key.
    pub public_key: PublicKey,
    /// Signing secret. Zeroized on drop.
    pub secret_key: SecretKey,
    /// Current leaf index; `None` once revoked.
    pub merkle_index: Option<u64>,
    /// Types this attester may vouch for. Never empty.
    pub allowed_types: BTreeSet<EntityType>,
    /// SHA-256 of the bearer credential.
    pub credential_hash: CredentialHash,
    /// Lifecycle state.
    pub status: AttesterStatus,
    /// Registration order. Survivors are reindexed by this.
    pub registration_seq: u64,
    /// Registration time.
    pub created_at: Timestamp,
    /// Revocation time.
    pub revoked_at: Option<Timestamp>,
}

impl AttesterRecord {
    /// Whether the attester may currently sign.
    pub fn is_active(&self) -> bool {
        self.status == AttesterStatus::Active
    }

    /// Whether `entity_type` is in the allowed set.
    pub fn allows(&self, entity_type: EntityType) -> bool {
        self.allowed_types.contains(&entity_type)
    }

    /// The Merkle leaf: `hash(pubkey.x, pubkey.y)`.
    pub fn leaf(&self, hasher: &dyn FieldHasher) -> FieldElement {
        self.public_key.leaf(hasher)
    }

    /// Public view without secret material.
    pub fn view(&self) -> Attester {
        Attester {
            id: self.id.clone(),
            name: self.name.clone(),
            public_key: self.public_key,
            merkle_index: self.merkle_index,
            allowed_types: self.allowed_types.clone(),
            status: self.status,
            created_at: self.created_at,
            revoked_at: self.revoked_at,
        }
    }
}

/// Public attester view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attester {
    /// Unique id.
    pub id: AttesterId,
    /// Display name.
    pub name: String,
    /// Signing public key.
    pub public_key: PublicKey,
    /// Current leaf index; `None` once revoked.
    pub merkle_index: Option<u64>,
    /// Types this attester may vouch for.
    pub allowed_types: BTreeSet<EntityType>,
    /// Lifecycle state.
    pub status: AttesterStatus,
    /// Registration time.
    pub created_at: Timestamp,
    /// Revocation time.
    pub revoked_at: Option<Timestamp>,
}
