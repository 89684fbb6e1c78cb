//! The persisted per-fingerprint record

use serde::{Deserialize, Serialize};

use super::backtrace::representative_line;

/// One throttle record per fingerprint: the unit of atomic read-modify-write
///
/// The window-start marker is intentionally absent — it is the record's
/// last-modified time on storage, maintained by the store on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleRecord {
    /// Occurrences observed inside the current window
    pub count: u32,
    /// Cached subject line, for operators reading the store by hand
    pub subject: String,
    /// Filtered sample frames from the occurrence that created this state
    pub backtrace: Vec<String>,
    /// Last path segment of the first application-owned frame
    pub representative_line: String,
}

impl ThrottleRecord {
    /// Seed record for an occurrence, with the counter at zero
    ///
    /// `frames` should already be filtered (see
    /// [`BacktraceFilter`](super::backtrace::BacktraceFilter)); the
    /// representative line is derived from them.
    pub fn new(subject: String, frames: Vec<String>) -> Self {
        let representative_line = representative_line(&frames);
        ThrottleRecord {
            count: 0,
            subject,
            backtrace: frames,
            representative_line,
        }
    }

    /// Copy of this record with the given counter value
    pub fn with_count(&self, count: u32) -> Self {
        ThrottleRecord {
            count,
            ..self.clone()
        }
    }
}
