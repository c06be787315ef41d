//! # typeproof-crypto: Cryptographic Building Blocks
//!
//! - **Field hashing** ([`FieldHasher`]) with a SHA-256 reference
//!   implementation. Production wires the circuit's Poseidon here.
//! - **Attester signatures** ([`SignatureScheme`]) with an Ed25519
//!   reference scheme.
//! - **Credentials**: one-time bearer tokens stored only as hashes.
//! - **Incremental Merkle tree** of fixed depth with zero-padded proofs.
//!
//! ## Crate Policy
//!
//! - Depends only on `typeproof-core` internally.
//! - Capabilities are object-safe traits shared as `Arc<dyn _>`.
//! - Secret material zeroizes on drop and is redacted from `Debug`.

pub mod credential;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod signature;

pub use credential::{Credential, CredentialHash};
pub use error::{CryptoError, MerkleError};
pub use hash::{derive_commitment, derive_nullifier, FieldHasher, Sha256FieldHasher};
pub use merkle::{IncrementalMerkleTree, MerkleProof, PathElement, MAX_DEPTH};
pub use signature::{Ed25519Scheme, KeyPair, PublicKey, SecretKey, Signature, SignatureScheme};
