//! Backtrace frame filtering
//!
//! Recorded sample frames exclude runtime and harness noise so that the
//! persisted record points at application code. Filtering is best-effort:
//! when every frame is filtered away the record simply carries no samples.

/// Substring filter applied to stack frames before they are recorded
#[derive(Debug, Clone)]
pub struct BacktraceFilter {
    patterns: Vec<String>,
}

/// Frames matching any of these substrings are dropped by default: the
/// standard-library runtime, registry dependencies, and bench harnesses.
pub const DEFAULT_FILTER_PATTERNS: &[&str] = &["/rustc/", "/cargo/registry/", "benchmark"];

impl Default for BacktraceFilter {
    fn default() -> Self {
        BacktraceFilter {
            patterns: DEFAULT_FILTER_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl BacktraceFilter {
    /// Create a filter with an explicit pattern list
    ///
    /// An empty list keeps every frame.
    pub fn new(patterns: Vec<String>) -> Self {
        BacktraceFilter { patterns }
    }

    /// Add one more pattern to the filter
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Drop frames matching any configured pattern, preserving order
    pub fn filter(&self, frames: &[String]) -> Vec<String> {
        frames
            .iter()
            .filter(|frame| !self.patterns.iter().any(|p| frame.contains(p.as_str())))
            .cloned()
            .collect()
    }
}

/// Best-effort single source line for the record
///
/// Returns the last `/`-segment of the first surviving frame, or an empty
/// string when no frame survives.
pub fn representative_line(frames: &[String]) -> String {
    frames
        .first()
        .map(|frame| frame.rsplit('/').next().unwrap_or(frame).to_string())
        .unwrap_or_default()
}
