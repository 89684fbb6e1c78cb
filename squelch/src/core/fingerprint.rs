//! Fingerprint derivation
//!
//! A fingerprint is the stable identifier that groups occurrences of "the
//! same" error for throttling. It is derived from the composed subject line
//! rather than a raw stack hash, so two occurrences that an operator would
//! read as the same alert collapse into one counter. The URL-safe base64
//! encoding of the subject doubles as the record's file stem, making a
//! lookup by fingerprint a direct path lookup instead of a directory scan.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use std::fmt;

/// Stable grouping key for one class of error occurrence
///
/// Derivation is total: every subject yields a fingerprint. When an
/// occurrence carries no backtrace at all, the subject still contains the
/// error kind, so the fingerprint degrades to grouping by kind and message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    subject: String,
    stem: String,
}

impl Fingerprint {
    /// Derive a fingerprint from a composed subject line
    pub fn from_subject(subject: &str) -> Self {
        Fingerprint {
            subject: subject.to_string(),
            stem: URL_SAFE.encode(subject),
        }
    }

    /// The subject this fingerprint was derived from
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Filesystem-safe stem used as the record's file name
    ///
    /// The encoding is reversible, so an operator can decode a file name
    /// back to the subject it throttles.
    pub fn stem(&self) -> &str {
        &self.stem
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem)
    }
}
