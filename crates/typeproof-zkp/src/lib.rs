//! # typeproof-zkp: Proof Verification Capability
//!
//! The node never generates or checks circuits itself. This crate defines the
//! seam to whatever verifier the operator deploys:
//!
//! - [`ProofSystem`], the verifier trait.
//! - [`PublicSignals`], the fixed five-slot signal layout.
//! - [`Proof`] and [`VerificationKey`] envelopes in prover-tooling JSON shape.
//! - [`MockProofSystem`], a deterministic SHA-256 backend for tests.

pub mod mock;
pub mod signals;
pub mod traits;

pub use mock::{MockProofSystem, MOCK_PROTOCOL};
pub use signals::{PublicSignals, SignalError, PUBLIC_SIGNAL_COUNT};
pub use traits::{Proof, ProofSystem, VerificationKey, VerifyError};
