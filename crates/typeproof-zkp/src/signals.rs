//! # Public Signals
//!
//! The type-proof circuit exposes exactly five public signals, in a fixed
//! order:
//!
//! | Slot | Signal |
//! |------|--------|
//! | 0 | nullifier |
//! | 1 | entity commitment |
//! | 2 | claimed type code |
//! | 3 | attesters root |
//! | 4 | context id |
//!
//! Prover tooling emits them as an array of decimal strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeproof_core::{ErrorKind, FieldElement, FieldError};

/// Number of public signals.
pub const PUBLIC_SIGNAL_COUNT: usize = 5;

/// Error decoding public signals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// Wrong number of signals.
    #[error("expected 5 public signals, got {0}")]
    Arity(usize),

    /// A signal was not a valid field element.
    #[error("public signal {slot}: {source}")]
    Field {
        /// Offending slot.
        slot: usize,
        /// Decoding failure.
        source: FieldError,
    },
}

impl SignalError {
    /// Always [`ErrorKind::Validation`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// The five public signals, named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicSignals {
    /// `hash(entity_secret, context_id)`.
    pub nullifier: FieldElement,
    /// The entity's pseudonym.
    pub entity_commitment: FieldElement,
    /// Numeric code of the claimed type. Not yet checked against the table.
    pub claimed_type: FieldElement,
    /// Attester root the proof was generated against.
    pub attesters_root: FieldElement,
    /// Verifier-chosen context.
    pub context_id: FieldElement,
}

impl PublicSignals {
    /// Build from circuit order.
    pub fn from_array(signals: [FieldElement; PUBLIC_SIGNAL_COUNT]) -> Self {
        let [nullifier, entity_commitment, claimed_type, attesters_root, context_id] = signals;
        Self {
            nullifier,
            entity_commitment,
            claimed_type,
            attesters_root,
            context_id,
        }
    }

    /// Build from a slice, checking arity.
    pub fn from_slice(signals: &[FieldElement]) -> Result<Self, SignalError> {
        let array: [FieldElement; PUBLIC_SIGNAL_COUNT] = signals
            .try_into()
            .map_err(|_| SignalError::Arity(signals.len()))?;
        Ok(Self::from_array(array))
    }

    /// Parse prover output (decimal or `0x`-hex strings).
    pub fn parse<S: AsRef<str>>(signals: &[S]) -> Result<Self, SignalError> {
        if signals.len() != PUBLIC_SIGNAL_COUNT {
            return Err(SignalError::Arity(signals.len()));
        }
        let parsed = signals
            .iter()
            .enumerate()
            .map(|(slot, s)| {
                FieldElement::parse(s.as_ref()).map_err(|source| SignalError::Field { slot, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_slice(&parsed)
    }

    /// Circuit order.
    pub fn to_array(&self) -> [FieldElement; PUBLIC_SIGNAL_COUNT] {
        [
            self.nullifier,
            self.entity_commitment,
            self.claimed_type,
            self.attesters_root,
            self.context_id,
        ]
    }
}
