//! # Squelch
//!
//! A persistent, crash-tolerant notification throttle for error reporting.
//!
//! ## Overview
//!
//! When a recurring error starts firing hundreds of times per minute, every
//! occurrence does not deserve a page. Squelch decides which occurrences do:
//! it derives a stable [`Fingerprint`] for each error, keeps one durable
//! counter record per fingerprint on local disk, and admits only the first
//! `count_limit` occurrences inside a window. Once the fingerprint has been
//! quiet for the window duration, the counter resets and the next occurrence
//! alerts again.
//!
//! The state survives process restarts without any external service: records
//! are JSON documents under a day-partitioned directory tree, and the
//! read-modify-write over each record is guarded by a per-fingerprint
//! advisory lock file so multiple host processes sharing one storage root
//! cannot over-admit.
//!
//! ## Quick Start
//!
//! ```no_run
//! use squelch::{FileStore, Fingerprint, Throttle, ThrottleLimits, ThrottleRecord};
//! use std::time::{Duration, SystemTime};
//!
//! let store = FileStore::new("/var/log/my-app/squelch");
//! let mut throttle = Throttle::new(store);
//!
//! let limits = ThrottleLimits {
//!     count_limit: 5,
//!     window: Duration::from_secs(30 * 60),
//! };
//!
//! let subject = "[ERROR] (TimeoutError) \"upstream did not respond\"";
//! let fingerprint = Fingerprint::from_subject(subject);
//! let seed = ThrottleRecord::new(subject.to_string(), vec![]);
//!
//! let outcome = throttle
//!     .check(&fingerprint, seed, limits, SystemTime::now())
//!     .unwrap();
//!
//! if outcome.admitted {
//!     println!("send the notification ({} so far in this window)", outcome.count);
//! } else {
//!     println!("suppressed ({} occurrences in this window)", outcome.count);
//! }
//! ```
//!
//! ## Store Types
//!
//! - [`FileStore`] — the durable store described above. This is the one to
//!   use in production.
//! - [`MemoryStore`] — a process-local map with the same trait surface, for
//!   tests and hosts that do not need persistence.
//!
//! ## Grouping Semantics
//!
//! The fingerprint is derived from the composed subject line (see
//! [`core::subject`]), so throttling groups by what an operator would read,
//! not by a raw stack hash. Subjects that embed variable numbers fragment
//! into distinct fingerprints unless digit normalization is enabled in
//! [`core::subject::SubjectOptions`].
//!
//! ## Features
//!
//! - `ahash` (default): use AHash for the in-memory store map

pub mod core;

pub use core::{
    BacktraceFilter, Decision, FileStore, FileStoreBuilder, Fingerprint, MemoryStore, StoreError,
    Throttle, ThrottleLimits, ThrottleOutcome, ThrottleRecord, ThrottleStore, decide,
};
