//! # typeproof-core: Foundational Types
//!
//! This crate is the leaf of the typeproof dependency graph. It defines the
//! primitives every other crate agrees on:
//!
//! 1. **`FieldElement`.** An element of the BN254 scalar field, the field the
//!    external proof circuits operate over. All commitments, nullifiers,
//!    Merkle nodes, and public signals are field elements.
//!
//! 2. **Closed `EntityType` table.** One enum, exhaustive code-to-label
//!    mapping. Unknown codes and labels are rejected at the boundary rather
//!    than looked up in a runtime dictionary.
//!
//! 3. **Identifier newtypes.** `AttesterId` and `AttestationId` are validated
//!    on construction. No bare strings for identifiers.
//!
//! 4. **UTC-only timestamps** with an injectable [`Clock`].
//!
//! 5. **`CanonicalBytes`** as the only input to [`sha256_digest`], used for
//!    audit-entry digests.
//!
//! 6. **`ErrorKind`**, the shared error taxonomy every crate error maps into.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `typeproof-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod entity_type;
pub mod error;
pub mod field;
pub mod hex;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_bytes, sha256_digest, ContentDigest};
pub use entity_type::{EntityCategory, EntityType, ENTITY_TYPE_COUNT};
pub use error::{CanonicalizationError, ErrorKind, FieldError, ValidationError};
pub use field::FieldElement;
pub use identity::{AttestationId, AttesterId};
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
