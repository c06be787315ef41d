//! # Verification Policy
//!
//! What a verifier demands before an interaction, graded by
//! [`InteractionLevel`]:
//!
//! - `Anonymous`: nothing.
//! - `TypeOnly`: a valid, unreplayed type proof.
//! - `TypeWithStanding`: plus enough public attestations, optionally recent.
//! - `FullAccountability`: plus disclosure of the full public history.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use typeproof_core::{EntityType, FieldElement, ValidationError};

/// Requested assurance, totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionLevel {
    /// No proof required.
    Anonymous = 0,
    /// Type proof required.
    TypeOnly = 1,
    /// Type proof and public standing.
    TypeWithStanding = 2,
    /// Standing, with the public history disclosed.
    FullAccountability = 3,
}

impl InteractionLevel {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::TypeOnly => "type_only",
            Self::TypeWithStanding => "type_with_standing",
            Self::FullAccountability => "full_accountability",
        }
    }

    /// Numeric rank.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Inverse of [`Self::rank`].
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Anonymous),
            1 => Some(Self::TypeOnly),
            2 => Some(Self::TypeWithStanding),
            3 => Some(Self::FullAccountability),
            _ => None,
        }
    }
}

impl std::fmt::Display for InteractionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymous" => Ok(Self::Anonymous),
            "type_only" => Ok(Self::TypeOnly),
            "type_with_standing" => Ok(Self::TypeWithStanding),
            "full_accountability" => Ok(Self::FullAccountability),
            other => Err(ValidationError::InvalidIdentifier {
                value: other.to_string(),
                reason: "unknown interaction level".to_string(),
            }),
        }
    }
}

/// One reason an evaluation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// Requested level is below the policy minimum.
    LevelBelowMinimum {
        /// What the caller asked for.
        requested: InteractionLevel,
        /// What the policy demands.
        minimum: InteractionLevel,
    },
    /// No type proof was supplied.
    MissingZkProof,
    /// The type proof failed verification.
    ZkProofInvalid {
        /// Gateway error text.
        detail: String,
    },
    /// The proof is against a superseded attester root.
    StaleRoot,
    /// The proof's root is not one the policy trusts.
    UntrustedRoot,
    /// The proof is for another commitment than the package claims.
    CommitmentMismatch,
    /// The nullifier was consumed already.
    NullifierAlreadyUsed,
    /// The proven type is outside the policy's allowed set.
    TypeNotAllowed {
        /// The proven type.
        entity_type: EntityType,
    },
    /// Too few public attestations.
    InsufficientPublicAttestations {
        /// Attestations on record.
        found: u64,
        /// Attestations required.
        required: u64,
    },
    /// Too few public attestations inside the age window.
    StaleAttestations {
        /// Attestations inside the window.
        fresh: u64,
        /// Attestations required.
        required: u64,
    },
}

impl PolicyViolation {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LevelBelowMinimum { .. } => "level_below_minimum",
            Self::MissingZkProof => "missing_zk_proof",
            Self::ZkProofInvalid { .. } => "zk_proof_invalid",
            Self::StaleRoot => "stale_root",
            Self::UntrustedRoot => "untrusted_root",
            Self::CommitmentMismatch => "commitment_mismatch",
            Self::NullifierAlreadyUsed => "nullifier_already_used",
            Self::TypeNotAllowed { .. } => "type_not_allowed",
            Self::InsufficientPublicAttestations { .. } => "insufficient_public_attestations",
            Self::StaleAttestations { .. } => "stale_attestations",
        }
    }
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LevelBelowMinimum { requested, minimum } => {
                write!(f, "level {requested} is below minimum {minimum}")
            }
            Self::ZkProofInvalid { detail } => write!(f, "zk proof invalid: {detail}"),
            Self::TypeNotAllowed { entity_type } => write!(f, "type {entity_type} not allowed"),
            Self::InsufficientPublicAttestations { found, required } => {
                write!(f, "{found} public attestations, {required} required")
            }
            Self::StaleAttestations { fresh, required } => {
                write!(f, "{fresh} recent public attestations, {required} required")
            }
            other => f.write_str(other.code()),
        }
    }
}

/// A verifier's requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationPolicy {
    /// Lowest level the verifier accepts.
    pub min_level: InteractionLevel,
    /// If set, only these types pass.
    pub allowed_types: Option<BTreeSet<EntityType>>,
    /// Public attestations needed at `TypeWithStanding` and above.
    pub min_public_attestations: u64,
    /// If set, attestations older than this many seconds do not count.
    pub max_attestation_age_secs: Option<u64>,
    /// If non-empty, proofs must be against one of these roots.
    pub trusted_roots: BTreeSet<FieldElement>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            min_level: InteractionLevel::Anonymous,
            allowed_types: None,
            min_public_attestations: 0,
            max_attestation_age_secs: None,
            trusted_roots: BTreeSet::new(),
        }
    }
}

impl VerificationPolicy {
    /// Policy with the given minimum and nothing else.
    pub fn at_least(min_level: InteractionLevel) -> Self {
        Self {
            min_level,
            ..Self::default()
        }
    }

    /// Restrict to `types`.
    pub fn allow_types(mut self, types: impl IntoIterator<Item = EntityType>) -> Self {
        self.allowed_types = Some(types.into_iter().collect());
        self
    }

    /// Require `count` public attestations.
    pub fn require_public_attestations(mut self, count: u64) -> Self {
        self.min_public_attestations = count;
        self
    }

    /// Count only attestations younger than `secs`.
    pub fn max_age_secs(mut self, secs: u64) -> Self {
        self.max_attestation_age_secs = Some(secs);
        self
    }

    /// Trust `root`.
    pub fn trust_root(mut self, root: FieldElement) -> Self {
        self.trusted_roots.insert(root);
        self
    }

    /// Whether `entity_type` passes the type restriction.
    pub fn allows(&self, entity_type: EntityType) -> bool {
        self.allowed_types
            .as_ref()
            .map_or(true, |set| set.contains(&entity_type))
    }
}
