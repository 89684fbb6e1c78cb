//! Durable file-backed store
//!
//! One JSON document per fingerprint under a day-partitioned tree:
//!
//! ```text
//! <root>/
//!   2026-08-06/
//!     W0VSUk9SXSAoVGltZW91dEVycm9yKQ==.json
//!     W0VSUk9SXSAoVGltZW91dEVycm9yKQ==.lock     (transient)
//! ```
//!
//! The day directory bounds how many records any maintenance sweep has to
//! look at and lets operators rotate or delete whole days. The file stem is
//! the fingerprint's URL-safe base64 stem, so a lookup is a direct path
//! probe, never a scan.
//!
//! Two occurrences of the same fingerprint may race from different
//! processes sharing this root. The store therefore takes a per-fingerprint
//! advisory lock before the read-modify-write: a `.lock` file created with
//! `O_CREAT|O_EXCL`, retried with backoff, and taken over once it is older
//! than the staleness bound (a crashed holder must not wedge alerting
//! forever). Record writes go to a temp file in the same directory and are
//! renamed into place, so readers see either the old or the new document,
//! never a torn one.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use time::OffsetDateTime;

use super::{StoreError, ThrottleStore};
use crate::core::fingerprint::Fingerprint;
use crate::core::record::ThrottleRecord;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// File-backed throttle store
///
/// # Example
///
/// ```no_run
/// use squelch::FileStore;
/// use std::time::Duration;
///
/// let store = FileStore::builder("/var/log/my-app/squelch")
///     .lock_timeout(Duration::from_secs(1))
///     .build();
/// ```
pub struct FileStore {
    root: PathBuf,
    lock_timeout: Duration,
    lock_retry_interval: Duration,
    stale_lock_age: Duration,
}

/// Builder for configuring a [`FileStore`]
pub struct FileStoreBuilder {
    root: PathBuf,
    lock_timeout: Duration,
    lock_retry_interval: Duration,
    stale_lock_age: Duration,
}

/// Held advisory lock; the lock file is removed on drop
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path)
            && err.kind() != ErrorKind::NotFound
        {
            tracing::debug!(path = %self.path.display(), %err, "failed to remove lock file");
        }
    }
}

impl FileStore {
    /// Create a store rooted at `root` with default lock tuning
    ///
    /// The directory tree is created lazily on first save; a missing root
    /// is not an error.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::builder(root).build()
    }

    /// Create a builder for fine-grained lock tuning
    pub fn builder(root: impl Into<PathBuf>) -> FileStoreBuilder {
        FileStoreBuilder {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_retry_interval: DEFAULT_LOCK_RETRY_INTERVAL,
            stale_lock_age: DEFAULT_STALE_LOCK_AGE,
        }
    }

    /// Storage root this store writes under
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn day_dir(&self, now: SystemTime) -> PathBuf {
        let day = OffsetDateTime::from(now).date();
        self.root.join(day.to_string())
    }

    fn record_path(&self, fingerprint: &Fingerprint, now: SystemTime) -> PathBuf {
        self.day_dir(now).join(format!("{}.json", fingerprint.stem()))
    }

    fn lock_path(&self, fingerprint: &Fingerprint, now: SystemTime) -> PathBuf {
        self.day_dir(now).join(format!("{}.lock", fingerprint.stem()))
    }

    fn ensure_day_dir(&self, now: SystemTime) -> Result<PathBuf, StoreError> {
        let dir = self.day_dir(now);
        // create_dir_all treats "already exists" as success, which also
        // covers two processes discovering the missing directory at once
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    fn try_take_stale_lock(&self, path: &Path, now: SystemTime) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            // Holder released it between our attempt and this probe
            return true;
        };
        let age = meta
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .unwrap_or(Duration::ZERO);

        if age < self.stale_lock_age {
            return false;
        }

        tracing::warn!(
            path = %path.display(),
            ?age,
            "taking over stale throttle lock"
        );
        // A concurrent takeover may have removed it first; that is fine
        let _ = fs::remove_file(path);
        true
    }
}

impl ThrottleStore for FileStore {
    type Guard = FileLock;

    fn lock(
        &mut self,
        fingerprint: &Fingerprint,
        now: SystemTime,
    ) -> Result<FileLock, StoreError> {
        let path = self.lock_path(fingerprint, now);
        let mut waited = Duration::ZERO;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(FileLock { path }),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if self.try_take_stale_lock(&path, now) {
                        continue;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    // Day directory does not exist yet
                    self.ensure_day_dir(now)?;
                    continue;
                }
                Err(source) => return Err(StoreError::Io { path, source }),
            }

            if waited >= self.lock_timeout {
                return Err(StoreError::LockTimeout { path, waited });
            }
            std::thread::sleep(self.lock_retry_interval);
            waited += self.lock_retry_interval;
        }
    }

    fn load(
        &mut self,
        fingerprint: &Fingerprint,
        now: SystemTime,
    ) -> Result<Option<ThrottleRecord>, StoreError> {
        let path = self.record_path(fingerprint, now);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        match serde_json::from_slice(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                // A corrupt document degrades to "first occurrence" rather
                // than silencing alerting for this fingerprint
                tracing::warn!(
                    path = %path.display(),
                    %err,
                    "unreadable throttle record, treating as missing"
                );
                Ok(None)
            }
        }
    }

    fn age(
        &mut self,
        fingerprint: &Fingerprint,
        now: SystemTime,
    ) -> Result<Option<Duration>, StoreError> {
        let path = self.record_path(fingerprint, now);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let mtime = meta
            .modified()
            .map_err(|source| StoreError::Io { path, source })?;

        // Clock skew can put mtime in the future; read that as a fresh save
        Ok(Some(now.duration_since(mtime).unwrap_or(Duration::ZERO)))
    }

    fn save(
        &mut self,
        fingerprint: &Fingerprint,
        record: &ThrottleRecord,
        now: SystemTime,
    ) -> Result<(), StoreError> {
        let dir = self.ensure_day_dir(now)?;
        let path = self.record_path(fingerprint, now);
        let tmp = dir.join(format!("{}.json.tmp", fingerprint.stem()));

        let raw = serde_json::to_vec(record)?;
        fs::write(&tmp, raw).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(
            fingerprint = %fingerprint,
            count = record.count,
            path = %path.display(),
            "saved throttle record"
        );
        Ok(())
    }
}

impl FileStoreBuilder {
    /// How long to wait for a contended fingerprint lock before giving up
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Pause between lock acquisition attempts
    pub fn lock_retry_interval(mut self, interval: Duration) -> Self {
        self.lock_retry_interval = interval;
        self
    }

    /// Age past which another holder's lock is considered abandoned
    pub fn stale_lock_age(mut self, age: Duration) -> Self {
        self.stale_lock_age = age;
        self
    }

    /// Build the store with the configured settings
    pub fn build(self) -> FileStore {
        FileStore {
            root: self.root,
            lock_timeout: self.lock_timeout,
            lock_retry_interval: self.lock_retry_interval,
            stale_lock_age: self.stale_lock_age,
        }
    }
}
