//! Core components of the squelch throttling library
//!
//! This module contains the fundamental building blocks:
//! - [`subject`]: subject-line composition and digit normalization
//! - [`fingerprint`]: stable grouping keys derived from subjects
//! - [`backtrace`]: frame filtering for recorded samples
//! - [`record`]: the persisted per-fingerprint document
//! - [`decision`]: the pure admit/deny policy
//! - [`store`]: durable and in-memory storage backends
//! - [`throttle`]: the lock → load → decide → save orchestrator

pub mod backtrace;
pub mod decision;
pub mod fingerprint;
pub mod record;
pub mod store;
pub mod subject;
pub mod throttle;

pub use backtrace::BacktraceFilter;
pub use decision::{Decision, ThrottleLimits, decide};
pub use fingerprint::Fingerprint;
pub use record::ThrottleRecord;
pub use store::{FileStore, FileStoreBuilder, MemoryStore, StoreError, ThrottleStore};
pub use throttle::{Throttle, ThrottleOutcome};
