//! # typeproof-registry: Stateful Registries
//!
//! The three pieces of mutable state behind attestation and verification:
//!
//! - [`AttesterRegistry`]: authorities allowed to vouch for entity types,
//!   their Merkle tree, root versions and audit trail.
//! - [`PublicTrustRegistry`]: the append-only log of visible attestations.
//! - [`NullifierLedger`]: the at-most-once replay guard.
//!
//! Each writes through a storage trait from [`storage`]. [`MemoryStore`]
//! implements all of them.

pub mod attester;
pub mod audit;
pub mod error;
pub mod memory;
pub mod nullifier;
pub mod public_trust;
pub mod registry;
pub mod storage;

pub use attester::{Attester, AttesterRecord, AttesterStatus};
pub use audit::{AuditAction, AuditEntry};
pub use error::{NullifierError, RegistryError, StorageError};
pub use memory::MemoryStore;
pub use nullifier::{NullifierLedger, NullifierRecord, NullifierStatus};
pub use public_trust::{public_attestation_leaf, PublicAttestation, PublicStanding, PublicTrustRegistry};
pub use registry::{AttesterProof, AttesterRegistry, AttesterSession};
pub use storage::{NullifierStore, PublicTrustStore, RegistryCommit, RegistryStore, RootSnapshot};
