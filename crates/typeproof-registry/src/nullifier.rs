//! # Nullifier Ledger
//!
//! At-most-once replay guard. A nullifier is `hash(entity_secret,
//! context_id)`; it is present in the ledger iff some proof carrying it was
//! consumed.
//!
//! ## Security Invariant
//!
//! [`NullifierLedger::record`] is an atomic check-and-insert delegated to
//! the store. Of any number of concurrent callers recording the same
//! nullifier, exactly one succeeds; the rest get
//! [`NullifierError::NullifierUsed`]. Entries never expire.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typeproof_core::{Clock, FieldElement, Timestamp};

use crate::error::NullifierError;
use crate::storage::NullifierStore;

/// Whether a nullifier was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullifierStatus {
    /// Never consumed.
    Unused,
    /// Consumed; any later proof carrying it is a replay.
    Used,
}

impl NullifierStatus {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
        }
    }
}

impl std::fmt::Display for NullifierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consumption record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierRecord {
    /// The consumed nullifier.
    pub nullifier: FieldElement,
    /// Context the proof was bound to.
    pub context_id: FieldElement,
    /// Caller-supplied application domain, e.g. `chat.example`.
    pub domain: String,
    /// When it was consumed.
    pub consumed_at: Timestamp,
}

/// The replay guard.
#[derive(Debug, Clone)]
pub struct NullifierLedger {
    store: Arc<dyn NullifierStore>,
    clock: Arc<dyn Clock>,
}

impl NullifierLedger {
    /// Wrap a store.
    pub fn new(store: Arc<dyn NullifierStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Non-consuming lookup.
    pub fn status(&self, nullifier: &FieldElement) -> Result<NullifierStatus, NullifierError> {
        Ok(match self.store.get_nullifier(nullifier)? {
            Some(_) => NullifierStatus::Used,
            None => NullifierStatus::Unused,
        })
    }

    /// Consume `nullifier`. First caller wins.
    pub fn record(
        &self,
        nullifier: FieldElement,
        context_id: FieldElement,
        domain: &str,
    ) -> Result<NullifierRecord, NullifierError> {
        let record = NullifierRecord {
            nullifier,
            context_id,
            domain: domain.to_string(),
            consumed_at: self.clock.now(),
        };
        if !self.store.insert_if_absent(record.clone())? {
            tracing::warn!(nullifier = %nullifier, domain, "nullifier replay rejected");
            return Err(NullifierError::NullifierUsed(nullifier));
        }
        tracing::info!(nullifier = %nullifier, context_id = %context_id, domain, "nullifier consumed");
        Ok(record)
    }

    /// The consumption record, if consumed.
    pub fn get(&self, nullifier: &FieldElement) -> Result<Option<NullifierRecord>, NullifierError> {
        Ok(self.store.get_nullifier(nullifier)?)
    }

    /// Number of consumed nullifiers.
    pub fn len(&self) -> Result<u64, NullifierError> {
        Ok(self.store.nullifier_count()?)
    }

    /// True when nothing was consumed yet.
    pub fn is_empty(&self) -> Result<bool, NullifierError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use typeproof_core::FixedClock;

    fn ledger() -> NullifierLedger {
        let clock = Arc::new(FixedClock::new(Timestamp::parse("2026-02-01T00:00:00Z").unwrap()));
        NullifierLedger::new(Arc::new(MemoryStore::new()), clock)
    }

    #[test]
    fn status_then_record_then_replay() {
        let ledger = ledger();
        let n = FieldElement::from_u64(77);
        let ctx = FieldElement::from_u64(1);
        assert_eq!(ledger.status(&n).unwrap(), NullifierStatus::Unused);
        let rec = ledger.record(n, ctx, "chat").unwrap();
        assert_eq!(rec.consumed_at.to_iso8601(), "2026-02-01T00:00:00Z");
        assert_eq!(ledger.status(&n).unwrap(), NullifierStatus::Used);
        assert_eq!(
            ledger.record(n, ctx, "chat"),
            Err(NullifierError::NullifierUsed(n))
        );
        assert_eq!(ledger.get(&n).unwrap(), Some(rec));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn status_does_not_consume() {
        let ledger = ledger();
        let n = FieldElement::from_u64(5);
        for _ in 0..3 {
            assert_eq!(ledger.status(&n).unwrap(), NullifierStatus::Unused);
        }
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn concurrent_record_exactly_one_wins() {
        let ledger = ledger();
        let n = FieldElement::from_u64(4242);
        let wins = AtomicUsize::new(0);
        let used = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for i in 0..16u64 {
                let ledger = &ledger;
                let wins = &wins;
                let used = &used;
                s.spawn(move || match ledger.record(n, FieldElement::from_u64(i), "race") {
                    Ok(_) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(NullifierError::NullifierUsed(_)) => {
                        used.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(used.load(Ordering::SeqCst), 15);
    }
}
