//! # Dual-Proof Coordinator
//!
//! Reconciles the private signal (a zero-knowledge type proof) with the
//! public one (visible attestations) under a [`VerificationPolicy`].
//!
//! [`DualProofCoordinator::evaluate`] never fails. Every unmet requirement
//! becomes a [`PolicyViolation`] in the outcome, and the outcome is valid
//! iff there are none. Evaluation does not consume the nullifier; a verifier
//! that accepts the outcome consumes it through the gateway.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typeproof_core::{Clock, EntityType, FieldElement};
use typeproof_registry::{NullifierStatus, PublicAttestation, PublicTrustRegistry};
use typeproof_zkp::{Proof, PublicSignals};

use crate::error::ProtocolError;
use crate::gateway::ProofVerificationGateway;
use crate::policy::{InteractionLevel, PolicyViolation, VerificationPolicy};
use crate::trust_hash::TrustHashService;

/// A type proof with its public signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkEvidence {
    /// The proof.
    pub proof: Proof,
    /// Its public signals.
    pub public_signals: PublicSignals,
}

/// What an entity presents to a verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationPackage {
    /// The entity's pseudonym.
    pub entity_commitment: FieldElement,
    /// Required from `TypeOnly` upwards.
    pub zk: Option<ZkEvidence>,
}

/// Result of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// True iff `reasons` is empty.
    pub valid: bool,
    /// The evaluated level.
    pub level: InteractionLevel,
    /// Every unmet requirement, in check order.
    pub reasons: Vec<PolicyViolation>,
    /// The proven type, when a proof verified.
    pub entity_type: Option<EntityType>,
    /// Full public history, at `FullAccountability` only.
    pub disclosed_attestations: Option<Vec<PublicAttestation>>,
    /// Trust hash of the state the evaluation saw.
    pub trust_hash: FieldElement,
}

/// Policy evaluator.
#[derive(Debug, Clone)]
pub struct DualProofCoordinator {
    policy: VerificationPolicy,
    gateway: Arc<ProofVerificationGateway>,
    public: Arc<PublicTrustRegistry>,
    trust: TrustHashService,
    clock: Arc<dyn Clock>,
}

impl DualProofCoordinator {
    /// Build an evaluator for `policy`.
    pub fn new(
        policy: VerificationPolicy,
        gateway: Arc<ProofVerificationGateway>,
        public: Arc<PublicTrustRegistry>,
        trust: TrustHashService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            gateway,
            public,
            trust,
            clock,
        }
    }

    /// The policy being enforced.
    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// Evaluate `package` at `level`.
    pub fn evaluate(&self, level: InteractionLevel, package: &VerificationPackage) -> EvaluationOutcome {
        let mut reasons = Vec::new();
        let mut entity_type = None;
        let commitment = package.entity_commitment;

        if level < self.policy.min_level {
            reasons.push(PolicyViolation::LevelBelowMinimum {
                requested: level,
                minimum: self.policy.min_level,
            });
        }

        if level >= InteractionLevel::TypeOnly {
            entity_type = self.check_zk(package, &mut reasons);
        }

        if level >= InteractionLevel::TypeWithStanding {
            self.check_standing(&commitment, &mut reasons);
        }

        let disclosed_attestations =
            (level == InteractionLevel::FullAccountability).then(|| self.public.attestations_for(&commitment));

        let valid = reasons.is_empty();
        if valid {
            tracing::info!(level = %level, "policy evaluation passed");
        } else {
            let codes: Vec<&str> = reasons.iter().map(PolicyViolation::code).collect();
            tracing::warn!(level = %level, reasons = ?codes, "policy evaluation failed");
        }
        EvaluationOutcome {
            valid,
            level,
            reasons,
            entity_type,
            disclosed_attestations,
            trust_hash: self.trust.trust_hash_for(&commitment),
        }
    }

    fn check_zk(&self, package: &VerificationPackage, reasons: &mut Vec<PolicyViolation>) -> Option<EntityType> {
        let Some(zk) = &package.zk else {
            reasons.push(PolicyViolation::MissingZkProof);
            return None;
        };
        let signals = &zk.public_signals;
        if signals.entity_commitment != package.entity_commitment {
            reasons.push(PolicyViolation::CommitmentMismatch);
        }
        if !self.policy.trusted_roots.is_empty() && !self.policy.trusted_roots.contains(&signals.attesters_root) {
            reasons.push(PolicyViolation::UntrustedRoot);
        }

        let outcome = match self.gateway.verify_signals(&zk.proof, signals) {
            Ok(outcome) => outcome,
            Err(ProtocolError::RootMismatch { .. }) => {
                reasons.push(PolicyViolation::StaleRoot);
                return None;
            }
            Err(e) => {
                reasons.push(PolicyViolation::ZkProofInvalid { detail: e.to_string() });
                return None;
            }
        };

        if outcome.nullifier_status == NullifierStatus::Used {
            reasons.push(PolicyViolation::NullifierAlreadyUsed);
        }
        if !self.policy.allows(outcome.entity_type) {
            reasons.push(PolicyViolation::TypeNotAllowed {
                entity_type: outcome.entity_type,
            });
        }
        Some(outcome.entity_type)
    }

    fn check_standing(&self, commitment: &FieldElement, reasons: &mut Vec<PolicyViolation>) {
        let required = self.policy.min_public_attestations;
        let found = self.public.count_for(commitment);
        if found < required {
            reasons.push(PolicyViolation::InsufficientPublicAttestations { found, required });
        }

        if let Some(max_age) = self.policy.max_attestation_age_secs {
            let now = self.clock.now();
            let fresh = self
                .public
                .attestations_for(commitment)
                .iter()
                .filter(|a| a.timestamp <= now && now.secs_since(&a.timestamp) <= max_age)
                .count() as u64;
            if fresh < required {
                reasons.push(PolicyViolation::StaleAttestations { fresh, required });
            }
        }
    }
}
