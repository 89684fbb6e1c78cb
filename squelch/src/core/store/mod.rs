//! Storage backends for throttle records
//!
//! A store keeps exactly one [`ThrottleRecord`] per fingerprint and owns
//! the two properties the policy layer cannot provide: durability and
//! mutual exclusion. The trait is deliberately small — load, save, age,
//! and an exclusive per-fingerprint lock held across the read-modify-write.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use thiserror::Error;

use super::fingerprint::Fingerprint;
use super::record::ThrottleRecord;

mod file;
mod memory;

pub use file::{FileLock, FileStore, FileStoreBuilder};
pub use memory::MemoryStore;


/// Storage failures
///
/// Callers treat any of these as "deny": dropping one notification is
/// preferred over crashing the host or looping. The error is still
/// surfaced — silent loss of alerting is itself a failure an operator
/// must be able to detect.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem operation failed
    #[error("storage I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record document could not be serialized
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The per-fingerprint lock could not be acquired in time
    #[error("lock at {} still held after {waited:?}", .path.display())]
    LockTimeout { path: PathBuf, waited: Duration },
}

/// Store trait for per-fingerprint throttle state
///
/// `now` is threaded through every operation so callers control the clock;
/// stores never consult wall time on their own.
pub trait ThrottleStore {
    /// Exclusive lock token; releasing happens on drop
    type Guard;

    /// Acquire the per-fingerprint lock guarding the read-modify-write
    fn lock(&mut self, fingerprint: &Fingerprint, now: SystemTime)
    -> Result<Self::Guard, StoreError>;

    /// Read the persisted record, `None` when the fingerprint is unknown
    fn load(
        &mut self,
        fingerprint: &Fingerprint,
        now: SystemTime,
    ) -> Result<Option<ThrottleRecord>, StoreError>;

    /// Time since the record was last saved, `None` when no record exists
    ///
    /// A missing record reads as infinitely aged: the window has always
    /// already expired for a fingerprint never seen before.
    fn age(
        &mut self,
        fingerprint: &Fingerprint,
        now: SystemTime,
    ) -> Result<Option<Duration>, StoreError>;

    /// Atomically overwrite the record for the fingerprint
    ///
    /// A concurrent reader must never observe a partially written record.
    /// Saving refreshes the record's last-modified marker, which is the
    /// authoritative window-start time.
    fn save(
        &mut self,
        fingerprint: &Fingerprint,
        record: &ThrottleRecord,
        now: SystemTime,
    ) -> Result<(), StoreError>;
}
