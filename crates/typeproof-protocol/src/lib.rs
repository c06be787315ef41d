//! # typeproof-protocol: Protocol Services
//!
//! The operations a typeproof node exposes, built on the registries:
//!
//! - [`attestation`]: attesters sign type claims for entity commitments.
//! - [`gateway`]: staged verification of type proofs and nullifier
//!   consumption.
//! - [`policy`] and [`coordinator`]: graded requirements over the private
//!   and public trust signals.
//! - [`trust_hash`]: a compact commitment to the state an evaluation saw.
//! - [`node`]: the facade wiring all of it from configuration.
//!
//! [`config`] and [`telemetry`] carry the node's ambient setup.

pub mod attestation;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod node;
pub mod policy;
pub mod telemetry;
pub mod trust_hash;

pub use attestation::{attestation_message, Attestation, AttestationService};
pub use config::{ConfigError, LogFormat, ProtocolConfig};
pub use coordinator::{DualProofCoordinator, EvaluationOutcome, VerificationPackage, ZkEvidence};
pub use error::ProtocolError;
pub use gateway::{ProofVerificationGateway, VerificationOutcome, VerificationStage};
pub use node::{Capabilities, Stores, TypeproofNode};
pub use policy::{InteractionLevel, PolicyViolation, VerificationPolicy};
pub use telemetry::init_tracing;
pub use trust_hash::{TrustHashInputs, TrustHashService};
