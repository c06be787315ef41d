//! # Attestation Issuance
//!
//! An attester, authenticated by its bearer credential, signs
//! `hash(entity_commitment, type_code)` for an entity. The response bundles
//! the signature with the attester's current membership proof and root, so
//! the entity has every private input the type-proof circuit needs in one
//! round trip.
//!
//! ## Security Invariant
//!
//! Signature, key, proof and root in one [`Attestation`] all come from the
//! same registry version. The audit trail records a digest of the
//! commitment, never the commitment itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use typeproof_core::{sha256_bytes, AttesterId, Clock, EntityType, FieldElement, Timestamp};
use typeproof_crypto::{Credential, FieldHasher, MerkleProof, PublicKey, Signature, SignatureScheme};
use typeproof_registry::{
    AttesterRegistry, AuditAction, AuditEntry, PublicAttestation, PublicTrustRegistry,
};

use crate::error::ProtocolError;

/// The signed claim an entity feeds into its proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// The entity's pseudonym.
    pub entity_commitment: FieldElement,
    /// The vouched-for type.
    pub claimed_type: EntityType,
    /// The issuing attester.
    pub attester_id: AttesterId,
    /// Its signing key.
    pub attester_public_key: PublicKey,
    /// Signature over `message`.
    pub signature: Signature,
    /// `hash(entity_commitment, claimed_type.code)`.
    pub message: FieldElement,
    /// Issuance time.
    pub issued_at: Timestamp,
    /// The attester's membership proof at issuance.
    pub merkle_proof: MerkleProof,
    /// The root the proof folds to.
    pub attesters_root: FieldElement,
    /// Version of `attesters_root`.
    pub root_version: u64,
}

/// The message an attester signs.
pub fn attestation_message(
    hasher: &dyn FieldHasher,
    entity_commitment: &FieldElement,
    entity_type: EntityType,
) -> FieldElement {
    hasher.hash2(entity_commitment, &entity_type.to_field())
}

/// Issues, checks and publishes attestations.
#[derive(Debug, Clone)]
pub struct AttestationService {
    registry: Arc<AttesterRegistry>,
    public: Arc<PublicTrustRegistry>,
    clock: Arc<dyn Clock>,
}

impl AttestationService {
    /// Build over the two registries.
    pub fn new(
        registry: Arc<AttesterRegistry>,
        public: Arc<PublicTrustRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            public,
            clock,
        }
    }

    /// Sign a type claim for `entity_commitment`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Unauthorized`] for an unknown or revoked credential.
    /// - [`ProtocolError::InvalidType`] if `claimed_type` is not a known label.
    /// - [`ProtocolError::Forbidden`] if the attester may not vouch for it.
    /// - [`ProtocolError::SigningError`] if the signer fails.
    pub fn attest(
        &self,
        credential: &Credential,
        entity_commitment: FieldElement,
        claimed_type: &str,
    ) -> Result<Attestation, ProtocolError> {
        let session = self.registry.resolve_credential(credential)?;
        let entity_type: EntityType = claimed_type
            .parse()
            .map_err(|_| ProtocolError::InvalidType(claimed_type.to_string()))?;
        if !session.allows(entity_type) {
            tracing::warn!(
                attester_id = %session.attester_id(),
                entity_type = %entity_type,
                "attestation refused: type not permitted"
            );
            return Err(ProtocolError::Forbidden {
                attester_id: session.attester_id().clone(),
                entity_type,
            });
        }

        let message = attestation_message(self.registry.hasher().as_ref(), &entity_commitment, entity_type);
        let signature = session.sign(&message).map_err(ProtocolError::SigningError)?;
        let membership = session.proof()?;
        let attestation = Attestation {
            entity_commitment,
            claimed_type: entity_type,
            attester_id: session.attester_id().clone(),
            attester_public_key: session.public_key()?,
            signature,
            message,
            issued_at: self.clock.now(),
            merkle_proof: membership.proof,
            attesters_root: membership.root.root,
            root_version: membership.root.version,
        };
        drop(session);

        let commitment_digest = sha256_bytes(&entity_commitment.to_be_bytes());
        self.registry.append_audit(AuditEntry::new(
            AuditAction::AttestationIssued,
            attestation.attester_id.as_str(),
            json!({
                "entity_type": entity_type.as_str(),
                "commitment_digest": commitment_digest.to_hex(),
                "root_version": attestation.root_version,
            }),
            attestation.issued_at,
        ))?;
        tracing::info!(
            attester_id = %attestation.attester_id,
            entity_type = %entity_type,
            root_version = attestation.root_version,
            "attestation issued"
        );
        Ok(attestation)
    }

    /// Check an attestation against the current registry.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::ProofInvalid`] if the message, signature or
    ///   membership proof does not check out.
    /// - [`ProtocolError::RootMismatch`] if it was issued under a root that
    ///   is no longer current.
    pub fn verify_attestation(&self, attestation: &Attestation) -> Result<(), ProtocolError> {
        let hasher = self.registry.hasher().as_ref();
        let expected = attestation_message(hasher, &attestation.entity_commitment, attestation.claimed_type);
        if expected != attestation.message {
            return Err(ProtocolError::ProofInvalid("message does not match claim".to_string()));
        }
        let signer: &dyn SignatureScheme = self.registry.signer().as_ref();
        if !signer.verify(&attestation.attester_public_key, &attestation.message, &attestation.signature) {
            return Err(ProtocolError::ProofInvalid("bad attester signature".to_string()));
        }
        if attestation.merkle_proof.leaf != attestation.attester_public_key.leaf(hasher) {
            return Err(ProtocolError::ProofInvalid("membership proof is for another key".to_string()));
        }
        if !attestation.merkle_proof.verify(&attestation.attesters_root, hasher) {
            return Err(ProtocolError::ProofInvalid("membership proof does not fold to root".to_string()));
        }
        let current = self.registry.current_root();
        if attestation.attesters_root != current {
            return Err(ProtocolError::RootMismatch {
                presented: attestation.attesters_root,
                current,
            });
        }
        Ok(())
    }

    /// Issue an attestation and append it to the public registry.
    ///
    /// The public record and its audit entry are written together. On `Err`
    /// the public registry is unchanged, so the call may be retried without
    /// inflating the entity's attestation count.
    pub fn publish(
        &self,
        credential: &Credential,
        entity_commitment: FieldElement,
        claimed_type: &str,
    ) -> Result<(Attestation, PublicAttestation), ProtocolError> {
        let attestation = self.attest(credential, entity_commitment, claimed_type)?;
        let pubkey_hash = attestation
            .attester_public_key
            .leaf(self.registry.hasher().as_ref());
        let (public, entry) = self.public.add_audited_attestation(
            entity_commitment,
            attestation.claimed_type,
            pubkey_hash,
            attestation.attester_id.as_str(),
        )?;
        self.registry.mirror_audit(entry);
        Ok((attestation, public))
    }
}
