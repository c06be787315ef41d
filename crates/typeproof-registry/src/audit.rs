//! # Registry Audit Trail
//!
//! Every registry mutation and every attestation issuance appends one entry.
//! Entries are committed in the same atomic write as the state change they
//! describe, so the trail never disagrees with the registry.
//!
//! ## Security Invariant
//!
//! Every entry is individually digestable via `CanonicalBytes` +
//! `sha256_digest`. Metadata never carries raw entity commitments, secrets or
//! credentials; issuance entries store a digest of the commitment instead.

use serde::{Deserialize, Serialize};
use typeproof_core::{sha256_digest, CanonicalBytes, ContentDigest, Timestamp};
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// An attester was registered.
    AttesterRegistered,
    /// An attester was revoked and survivors reindexed.
    AttesterRevoked,
    /// An attester signed a type claim.
    AttestationIssued,
    /// A visible attestation was appended to the public trust registry.
    PublicAttestationAdded,
}

impl AuditAction {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttesterRegistered => "attester_registered",
            Self::AttesterRevoked => "attester_revoked",
            Self::AttestationIssued => "attestation_issued",
            Self::PublicAttestationAdded => "public_attestation_added",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Random v4 id.
    pub id: Uuid,
    /// The event type.
    pub action: AuditAction,
    /// The primary subject, usually an attester id.
    pub subject: String,
    /// Structured, float-free details.
    pub metadata: serde_json::Value,
    /// When the event was recorded.
    pub recorded_at: Timestamp,
}

impl AuditEntry {
    /// Create an entry with a fresh id.
    pub fn new(
        action: AuditAction,
        subject: impl Into<String>,
        metadata: serde_json::Value,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            subject: subject.into(),
            metadata,
            recorded_at,
        }
    }

    /// Content digest of the entry for tamper evidence.
    ///
    /// Returns `None` if canonicalization fails (metadata containing floats).
    pub fn digest(&self) -> Option<ContentDigest> {
        match CanonicalBytes::new(self) {
            Ok(canonical) => Some(sha256_digest(&canonical)),
            Err(e) => {
                tracing::warn!(action = %self.action, error = %e, "audit entry canonicalization failed; digest unavailable");
                None
            }
        }
    }
}
