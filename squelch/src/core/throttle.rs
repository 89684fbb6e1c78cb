//! The throttle orchestrator
//!
//! Runs the critical sequence for one occurrence: lock the fingerprint,
//! load the existing record, evaluate the policy, persist the next state,
//! release the lock. The lock spans the whole read-modify-write so two
//! concurrent occurrences of the same fingerprint can never both observe a
//! counter below the limit and both be admitted (the lost-update hazard).

use std::time::SystemTime;

use super::decision::{ThrottleLimits, decide};
use super::fingerprint::Fingerprint;
use super::record::ThrottleRecord;
use super::store::{StoreError, ThrottleStore};

/// What the throttle decided for one occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOutcome {
    /// Whether the notification should be sent
    pub admitted: bool,
    /// Occurrences recorded in the current window, this one included
    ///
    /// Zero means a fresh window: either a first-ever occurrence or the
    /// first after the window expired.
    pub count: u32,
}

/// Throttle engine over a pluggable store
///
/// Generic over [`ThrottleStore`] the same way a rate limiter is generic
/// over its state backend; limits travel with each call so hosts can vary
/// them per occurrence.
pub struct Throttle<S: ThrottleStore> {
    store: S,
}

impl<S: ThrottleStore> Throttle<S> {
    pub fn new(store: S) -> Self {
        Throttle { store }
    }

    /// Run the admit/deny check for one occurrence of `fingerprint`
    ///
    /// `seed` carries the subject and sample frames to persist; its counter
    /// is ignored. The record is saved whichever way the decision goes, so
    /// suppressed volume stays visible in the stored count.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the store cannot be read, written, or locked.
    /// Callers are expected to fail closed: treat the occurrence as denied
    /// and surface the error.
    pub fn check(
        &mut self,
        fingerprint: &Fingerprint,
        seed: ThrottleRecord,
        limits: ThrottleLimits,
        now: SystemTime,
    ) -> Result<ThrottleOutcome, StoreError> {
        let _guard = self.store.lock(fingerprint, now)?;

        let existing = self.store.load(fingerprint, now)?;
        let age = self.store.age(fingerprint, now)?;
        let decision = decide(existing, age, seed, limits);
        self.store.save(fingerprint, &decision.next, now)?;

        if !decision.admit {
            tracing::debug!(
                fingerprint = %fingerprint,
                count = decision.next.count,
                "occurrence suppressed"
            );
        }

        Ok(ThrottleOutcome {
            admitted: decision.admit,
            count: decision.next.count,
        })
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}
