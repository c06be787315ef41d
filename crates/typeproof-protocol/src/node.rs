//! # Node Facade
//!
//! [`TypeproofNode`] wires the registries and services together from a
//! [`ProtocolConfig`], a set of [`Capabilities`] and a set of [`Stores`].
//! A transport layer talks to this type only.

use std::sync::Arc;

use typeproof_core::{AttesterId, Clock, EntityType, FieldElement, SystemClock};
use typeproof_crypto::{Credential, Ed25519Scheme, FieldHasher, Sha256FieldHasher, SignatureScheme};
use typeproof_registry::{
    Attester, AttesterProof, AttesterRegistry, MemoryStore, NullifierLedger, NullifierRecord,
    NullifierStore, PublicAttestation, PublicTrustRegistry, PublicTrustStore, RegistryStore,
    RootSnapshot,
};
use typeproof_zkp::{MockProofSystem, Proof, ProofSystem, VerificationKey};

use crate::attestation::{Attestation, AttestationService};
use crate::config::ProtocolConfig;
use crate::coordinator::{DualProofCoordinator, EvaluationOutcome, VerificationPackage};
use crate::error::ProtocolError;
use crate::gateway::{ProofVerificationGateway, VerificationOutcome};
use crate::policy::{InteractionLevel, VerificationPolicy};
use crate::trust_hash::TrustHashService;

/// Injected cryptographic capabilities and the clock.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Field hash matching the circuits.
    pub hasher: Arc<dyn FieldHasher>,
    /// Attester signature scheme.
    pub signer: Arc<dyn SignatureScheme>,
    /// Proof verifier.
    pub proof_system: Arc<dyn ProofSystem>,
    /// Key for the deployed circuit. Its id should match the configured one.
    pub verification_key: VerificationKey,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl Capabilities {
    /// SHA-256 hashing, Ed25519 signing and the mock verifier.
    ///
    /// For tests and local development only; the mock verifier proves
    /// nothing.
    pub fn reference(verification_key_id: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            hasher: Arc::new(Sha256FieldHasher),
            signer: Arc::new(Ed25519Scheme),
            proof_system: Arc::new(MockProofSystem),
            verification_key: MockProofSystem::verification_key(verification_key_id),
            clock,
        }
    }
}

/// Storage backends, one per registry.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Attester rows, roots and audit.
    pub registry: Arc<dyn RegistryStore>,
    /// Public attestations.
    pub public: Arc<dyn PublicTrustStore>,
    /// Consumed nullifiers.
    pub nullifiers: Arc<dyn NullifierStore>,
}

impl Stores {
    /// Back every registry with one memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            registry: store.clone(),
            public: store.clone(),
            nullifiers: store,
        }
    }
}

/// A fully wired typeproof node.
#[derive(Debug, Clone)]
pub struct TypeproofNode {
    config: ProtocolConfig,
    clock: Arc<dyn Clock>,
    registry: Arc<AttesterRegistry>,
    public: Arc<PublicTrustRegistry>,
    attestation: AttestationService,
    gateway: Arc<ProofVerificationGateway>,
    trust: TrustHashService,
}

impl TypeproofNode {
    /// Open every registry over `stores` and wire the services.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Config`] for an invalid config, and any registry
    /// error from replaying stored state.
    pub fn open(config: ProtocolConfig, caps: Capabilities, stores: Stores) -> Result<Self, ProtocolError> {
        config.validate()?;
        if caps.verification_key.id != config.verification_key_id {
            tracing::warn!(
                configured = %config.verification_key_id,
                supplied = %caps.verification_key.id,
                "verification key id differs from configuration"
            );
        }
        let registry = Arc::new(AttesterRegistry::open(
            stores.registry,
            caps.hasher.clone(),
            caps.signer,
            caps.clock.clone(),
            config.attester_tree_depth,
        )?);
        let public = Arc::new(PublicTrustRegistry::open(
            stores.public,
            caps.hasher.clone(),
            caps.clock.clone(),
            config.public_tree_depth,
        )?);
        let ledger = NullifierLedger::new(stores.nullifiers, caps.clock.clone());
        let gateway = Arc::new(ProofVerificationGateway::new(
            caps.proof_system,
            caps.verification_key,
            registry.clone(),
            ledger,
        ));
        let attestation = AttestationService::new(registry.clone(), public.clone(), caps.clock.clone());
        let trust = TrustHashService::new(
            caps.hasher,
            registry.clone(),
            public.clone(),
            FieldElement::from_u64(config.trust_nonce),
        );
        tracing::info!(
            attester_depth = config.attester_tree_depth,
            public_depth = config.public_tree_depth,
            verification_key = %gateway.verification_key().id,
            "typeproof node ready"
        );
        Ok(Self {
            config,
            clock: caps.clock,
            registry,
            public,
            attestation,
            gateway,
            trust,
        })
    }

    /// In-memory node with reference capabilities and the system clock.
    pub fn in_memory(config: ProtocolConfig) -> Result<Self, ProtocolError> {
        let caps = Capabilities::reference(&config.verification_key_id, Arc::new(SystemClock));
        Self::open(config, caps, Stores::memory(Arc::new(MemoryStore::new())))
    }

    /// The active configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// The attester registry.
    pub fn registry(&self) -> &Arc<AttesterRegistry> {
        &self.registry
    }

    /// The public trust registry.
    pub fn public_registry(&self) -> &Arc<PublicTrustRegistry> {
        &self.public
    }

    /// The verification gateway.
    pub fn gateway(&self) -> &Arc<ProofVerificationGateway> {
        &self.gateway
    }

    // -- registry --------------------------------------------------------

    /// Register an attester.
    pub fn register_attester(
        &self,
        id: &str,
        name: &str,
        allowed_types: &[&str],
    ) -> Result<(Attester, Credential), ProtocolError> {
        let id = AttesterId::new(id)?;
        let types = allowed_types
            .iter()
            .map(|label| {
                label
                    .parse::<EntityType>()
                    .map_err(|_| ProtocolError::InvalidType((*label).to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.registry.register(id, name, types)?)
    }

    /// Revoke an attester.
    pub fn revoke_attester(&self, id: &str) -> Result<RootSnapshot, ProtocolError> {
        Ok(self.registry.revoke(&AttesterId::new(id)?)?)
    }

    /// Current proof for an attester.
    pub fn attester_proof(&self, id: &str) -> Result<AttesterProof, ProtocolError> {
        Ok(self.registry.proof_for(&AttesterId::new(id)?)?)
    }

    /// Current attester root.
    pub fn current_root(&self) -> RootSnapshot {
        self.registry.root_snapshot()
    }

    /// All attesters.
    pub fn list_attesters(&self) -> Vec<Attester> {
        self.registry.list_attesters()
    }

    // -- issuance --------------------------------------------------------

    /// Sign a type claim.
    pub fn attest(
        &self,
        credential: &Credential,
        entity_commitment: FieldElement,
        claimed_type: &str,
    ) -> Result<Attestation, ProtocolError> {
        self.attestation.attest(credential, entity_commitment, claimed_type)
    }

    /// Check an attestation against the current registry.
    pub fn verify_attestation(&self, attestation: &Attestation) -> Result<(), ProtocolError> {
        self.attestation.verify_attestation(attestation)
    }

    /// Sign a type claim and append it to the public registry.
    pub fn publish(
        &self,
        credential: &Credential,
        entity_commitment: FieldElement,
        claimed_type: &str,
    ) -> Result<(Attestation, PublicAttestation), ProtocolError> {
        self.attestation.publish(credential, entity_commitment, claimed_type)
    }

    // -- verification ----------------------------------------------------

    /// Verify a type proof without consuming it.
    pub fn verify<S: AsRef<str>>(&self, proof: &Proof, public_signals: &[S]) -> Result<VerificationOutcome, ProtocolError> {
        self.gateway.verify(proof, public_signals)
    }

    /// Consume a nullifier.
    pub fn record_consumption(
        &self,
        nullifier: FieldElement,
        context_id: FieldElement,
        domain: &str,
    ) -> Result<NullifierRecord, ProtocolError> {
        self.gateway.record_consumption(nullifier, context_id, domain)
    }

    /// Verify, then consume.
    pub fn verify_and_consume<S: AsRef<str>>(
        &self,
        proof: &Proof,
        public_signals: &[S],
        domain: &str,
    ) -> Result<(VerificationOutcome, NullifierRecord), ProtocolError> {
        self.gateway.verify_and_consume(proof, public_signals, domain)
    }

    // -- policy ----------------------------------------------------------

    /// An evaluator for `policy`.
    pub fn coordinator(&self, policy: VerificationPolicy) -> DualProofCoordinator {
        DualProofCoordinator::new(
            policy,
            self.gateway.clone(),
            self.public.clone(),
            self.trust.clone(),
            self.clock.clone(),
        )
    }

    /// Evaluate `package` at `level` under `policy`.
    pub fn evaluate(
        &self,
        policy: &VerificationPolicy,
        level: InteractionLevel,
        package: &VerificationPackage,
    ) -> EvaluationOutcome {
        self.coordinator(policy.clone()).evaluate(level, package)
    }

    // -- trust hash ------------------------------------------------------

    /// Current trust hash for an entity.
    pub fn trust_hash(&self, entity_commitment: &FieldElement) -> FieldElement {
        self.trust.trust_hash_for(entity_commitment)
    }

    /// Whether a previously obtained trust hash still holds.
    pub fn is_fresh(&self, entity_commitment: &FieldElement, expected: &FieldElement) -> bool {
        self.trust.is_fresh(entity_commitment, expected)
    }
}
