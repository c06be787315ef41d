//! # Proof Verification Gateway
//!
//! Checks an entity's type proof in stages:
//!
//! ```text
//! Received -> CryptoChecked -> RootChecked -> NullifierChecked -> Accepted
//! ```
//!
//! - `CryptoChecked`: the proof system accepts the proof for the signals.
//!   Rejection or a malformed proof is [`ProtocolError::ProofInvalid`]; a
//!   backend failure is [`ProtocolError::Verifier`] and may be retried.
//! - `RootChecked`: the signals' attesters root is the registry's current
//!   root. There is no grace window; any older root is
//!   [`ProtocolError::RootMismatch`].
//! - `NullifierChecked`: the nullifier status is looked up, not consumed.
//! - `Accepted`: the nullifier is unused and the proof may be consumed.
//!
//! Verification touches no shared mutable state. Consumption is a separate,
//! explicit step ([`ProofVerificationGateway::record_consumption`]), so a
//! verifier can check speculatively and consume only once it commits to the
//! interaction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typeproof_core::{EntityType, FieldElement};
use typeproof_registry::{AttesterRegistry, NullifierLedger, NullifierRecord, NullifierStatus};
use typeproof_zkp::{Proof, ProofSystem, PublicSignals, VerificationKey, VerifyError};

use crate::error::ProtocolError;

/// How far a verification got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStage {
    /// Signals decoded.
    Received,
    /// Proof system accepted the proof.
    CryptoChecked,
    /// Root is current.
    RootChecked,
    /// Nullifier status known.
    NullifierChecked,
    /// Ready to consume.
    Accepted,
}

impl VerificationStage {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::CryptoChecked => "crypto_checked",
            Self::RootChecked => "root_checked",
            Self::NullifierChecked => "nullifier_checked",
            Self::Accepted => "accepted",
        }
    }
}

impl std::fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a verification that passed the crypto and root checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// True iff `stage` is `Accepted`.
    pub valid: bool,
    /// Final stage reached.
    pub stage: VerificationStage,
    /// The proven type.
    pub entity_type: EntityType,
    /// Whether the nullifier was consumed already. Not changed by verify.
    pub nullifier_status: NullifierStatus,
    /// The decoded signals.
    pub public_signals: PublicSignals,
}

/// Verifies type proofs and consumes their nullifiers.
#[derive(Debug, Clone)]
pub struct ProofVerificationGateway {
    proof_system: Arc<dyn ProofSystem>,
    verification_key: VerificationKey,
    registry: Arc<AttesterRegistry>,
    ledger: NullifierLedger,
}

impl ProofVerificationGateway {
    /// Build a gateway.
    pub fn new(
        proof_system: Arc<dyn ProofSystem>,
        verification_key: VerificationKey,
        registry: Arc<AttesterRegistry>,
        ledger: NullifierLedger,
    ) -> Self {
        Self {
            proof_system,
            verification_key,
            registry,
            ledger,
        }
    }

    /// Verify a proof with signals as the prover emitted them.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Signals`] for the wrong arity or a bad element.
    /// - [`ProtocolError::Validation`] for an unknown type code.
    /// - [`ProtocolError::ProofInvalid`] if the proof system rejects it.
    /// - [`ProtocolError::Verifier`] if the proof system itself fails.
    /// - [`ProtocolError::RootMismatch`] for a non-current root.
    pub fn verify<S: AsRef<str>>(
        &self,
        proof: &Proof,
        public_signals: &[S],
    ) -> Result<VerificationOutcome, ProtocolError> {
        let signals = PublicSignals::parse(public_signals)?;
        self.verify_signals(proof, &signals)
    }

    /// Verify a proof with already decoded signals.
    pub fn verify_signals(
        &self,
        proof: &Proof,
        signals: &PublicSignals,
    ) -> Result<VerificationOutcome, ProtocolError> {
        let entity_type = EntityType::from_field(&signals.claimed_type)?;

        match self.proof_system.verify(&self.verification_key, signals, proof) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(nullifier = %signals.nullifier, "proof rejected by proof system");
                return Err(ProtocolError::ProofInvalid("proof does not verify".to_string()));
            }
            Err(e @ VerifyError::Backend(_)) => {
                tracing::error!(nullifier = %signals.nullifier, error = %e, "proof verifier failed");
                return Err(ProtocolError::Verifier(e));
            }
            Err(e) => {
                tracing::warn!(nullifier = %signals.nullifier, error = %e, "proof system error");
                return Err(ProtocolError::ProofInvalid(e.to_string()));
            }
        }

        let current = self.registry.current_root();
        if signals.attesters_root != current {
            tracing::warn!(
                presented = %signals.attesters_root,
                current = %current,
                "proof against stale attesters root"
            );
            return Err(ProtocolError::RootMismatch {
                presented: signals.attesters_root,
                current,
            });
        }

        let nullifier_status = self.ledger.status(&signals.nullifier)?;
        let stage = match nullifier_status {
            NullifierStatus::Unused => VerificationStage::Accepted,
            NullifierStatus::Used => VerificationStage::NullifierChecked,
        };
        tracing::debug!(
            entity_type = %entity_type,
            nullifier_status = %nullifier_status,
            stage = %stage,
            "proof verified"
        );
        Ok(VerificationOutcome {
            valid: stage == VerificationStage::Accepted,
            stage,
            entity_type,
            nullifier_status,
            public_signals: *signals,
        })
    }

    /// Consume a nullifier. Exactly one concurrent caller succeeds.
    pub fn record_consumption(
        &self,
        nullifier: FieldElement,
        context_id: FieldElement,
        domain: &str,
    ) -> Result<NullifierRecord, ProtocolError> {
        Ok(self.ledger.record(nullifier, context_id, domain)?)
    }

    /// Verify, then consume.
    ///
    /// # Errors
    ///
    /// Everything [`Self::verify`] returns, plus
    /// [`ProtocolError::NullifierUsed`] if the nullifier was consumed before
    /// or by a concurrent caller in between.
    pub fn verify_and_consume<S: AsRef<str>>(
        &self,
        proof: &Proof,
        public_signals: &[S],
        domain: &str,
    ) -> Result<(VerificationOutcome, NullifierRecord), ProtocolError> {
        let outcome = self.verify(proof, public_signals)?;
        if outcome.nullifier_status == NullifierStatus::Used {
            return Err(ProtocolError::NullifierUsed(outcome.public_signals.nullifier));
        }
        let record = self.record_consumption(
            outcome.public_signals.nullifier,
            outcome.public_signals.context_id,
            domain,
        )?;
        let outcome = VerificationOutcome {
            nullifier_status: NullifierStatus::Used,
            ..outcome
        };
        Ok((outcome, record))
    }

    /// The key proofs are checked against.
    pub fn verification_key(&self) -> &VerificationKey {
        &self.verification_key
    }

    /// The ledger consulted and written by this gateway.
    pub fn ledger(&self) -> &NullifierLedger {
        &self.ledger
    }
}
