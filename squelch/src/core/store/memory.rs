//! In-memory store
//!
//! Same trait surface as [`FileStore`](super::FileStore) with no
//! durability: state lives in a process-local map and is gone on restart.
//! Useful for tests and for hosts that only want storm suppression within
//! one process lifetime.

use std::time::{Duration, SystemTime};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

use super::{StoreError, ThrottleStore};
use crate::core::fingerprint::Fingerprint;
use crate::core::record::ThrottleRecord;

/// Process-local throttle store
///
/// Mutual exclusion comes from `&mut self`: a caller that owns the store
/// (or serializes access to it, as the notify layer's actor does) gets the
/// read-modify-write atomicity for free, so [`ThrottleStore::lock`] is a
/// no-op here.
#[derive(Default)]
pub struct MemoryStore {
    data: HashMap<String, (ThrottleRecord, SystemTime)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fingerprints currently tracked
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ThrottleStore for MemoryStore {
    type Guard = ();

    fn lock(&mut self, _fingerprint: &Fingerprint, _now: SystemTime) -> Result<(), StoreError> {
        Ok(())
    }

    fn load(
        &mut self,
        fingerprint: &Fingerprint,
        _now: SystemTime,
    ) -> Result<Option<ThrottleRecord>, StoreError> {
        Ok(self
            .data
            .get(fingerprint.stem())
            .map(|(record, _)| record.clone()))
    }

    fn age(
        &mut self,
        fingerprint: &Fingerprint,
        now: SystemTime,
    ) -> Result<Option<Duration>, StoreError> {
        Ok(self.data.get(fingerprint.stem()).map(|(_, saved_at)| {
            now.duration_since(*saved_at).unwrap_or(Duration::ZERO)
        }))
    }

    fn save(
        &mut self,
        fingerprint: &Fingerprint,
        record: &ThrottleRecord,
        now: SystemTime,
    ) -> Result<(), StoreError> {
        self.data
            .insert(fingerprint.stem().to_string(), (record.clone(), now));
        Ok(())
    }
}
