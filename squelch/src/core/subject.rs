//! Subject-line composition
//!
//! The composed subject serves two purposes: it is the human-readable
//! headline of the notification, and it is the basis of the throttling
//! fingerprint (see [`crate::Fingerprint`]). Anything volatile folded into
//! the subject therefore affects grouping — callers that embed variable
//! numbers (ids, counts, ports) should enable digit normalization so that
//! occurrences of the same error do not fragment into separate counters.

/// Maximum length of a composed subject, in characters, ellipsis included.
pub const MAX_SUBJECT_CHARS: usize = 120;

const ELLIPSIS: &str = "...";

/// Options controlling how a subject line is composed
#[derive(Debug, Clone, Default)]
pub struct SubjectOptions {
    /// Prefix prepended verbatim (e.g. `"[ERROR] "`)
    pub prefix: String,
    /// Caller-supplied accumulated-error count; rendered as `(N times)`
    /// when greater than one. This is independent of the throttle counter.
    pub accumulated_errors_count: Option<u32>,
    /// Correlation label (e.g. `"orders#create"`), included when present
    pub correlation: Option<String>,
    /// Include the quoted error message
    pub verbose: bool,
    /// Replace runs of digits with a placeholder before truncation
    pub normalize_digits: bool,
}

/// Compose a subject line from an error kind and message
///
/// The layout is `prefix (N times)label (Kind) "message"`, with the
/// annotation, label, and message each optional. The result is digit
/// normalized when requested and never exceeds [`MAX_SUBJECT_CHARS`]
/// characters; a truncated subject ends with `...`.
pub fn compose(kind: &str, message: &str, opts: &SubjectOptions) -> String {
    let mut subject = opts.prefix.clone();

    if let Some(count) = opts.accumulated_errors_count
        && count > 1
    {
        subject.push_str(&format!("({count} times)"));
    }

    if let Some(label) = &opts.correlation {
        subject.push_str(label);
    }

    if !subject.is_empty() && !subject.ends_with(' ') {
        subject.push(' ');
    }
    subject.push_str(&format!("({kind})"));

    if opts.verbose && !message.is_empty() {
        subject.push_str(&format!(" {message:?}"));
    }

    if opts.normalize_digits {
        subject = normalize_digits(&subject);
    }

    truncate(subject)
}

/// Replace every run of ASCII digits with a single `N`
///
/// `"worker 1234 timed out after 30s"` becomes `"worker N timed out after Ns"`.
pub fn normalize_digits(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;

    for ch in input.chars() {
        if ch.is_ascii_digit() {
            if !in_run {
                out.push('N');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }

    out
}

fn truncate(subject: String) -> String {
    let total = subject.chars().count();
    if total <= MAX_SUBJECT_CHARS {
        return subject;
    }

    let keep = MAX_SUBJECT_CHARS - ELLIPSIS.len();
    let mut out: String = subject.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_opts() -> SubjectOptions {
        SubjectOptions {
            prefix: "[ERROR] ".to_string(),
            verbose: true,
            ..SubjectOptions::default()
        }
    }

    #[test]
    fn test_basic_composition() {
        let subject = compose("TimeoutError", "upstream did not respond", &base_opts());
        assert_eq!(
            subject,
            "[ERROR] (TimeoutError) \"upstream did not respond\""
        );
    }

    #[test]
    fn test_correlation_label_included() {
        let opts = SubjectOptions {
            correlation: Some("orders#create".to_string()),
            ..base_opts()
        };
        let subject = compose("TimeoutError", "boom", &opts);
        assert_eq!(subject, "[ERROR] orders#create (TimeoutError) \"boom\"");
    }

    #[test]
    fn test_accumulated_count_annotation() {
        let opts = SubjectOptions {
            accumulated_errors_count: Some(3),
            ..base_opts()
        };
        let subject = compose("TimeoutError", "boom", &opts);
        assert!(subject.starts_with("[ERROR] (3 times)"));

        // A count of one is not worth annotating
        let opts = SubjectOptions {
            accumulated_errors_count: Some(1),
            ..base_opts()
        };
        let subject = compose("TimeoutError", "boom", &opts);
        assert!(!subject.contains("times"));
    }

    #[test]
    fn test_non_verbose_omits_message() {
        let opts = SubjectOptions {
            verbose: false,
            ..base_opts()
        };
        let subject = compose("TimeoutError", "secret detail", &opts);
        assert_eq!(subject, "[ERROR] (TimeoutError)");
    }

    #[test]
    fn test_truncation_caps_length_with_ellipsis() {
        let long_message = "x".repeat(300);
        let subject = compose("TimeoutError", &long_message, &base_opts());
        assert_eq!(subject.chars().count(), MAX_SUBJECT_CHARS);
        assert!(subject.ends_with("..."));
    }

    #[test]
    fn test_short_subject_untouched() {
        let subject = compose("E", "m", &base_opts());
        assert!(subject.chars().count() < MAX_SUBJECT_CHARS);
        assert!(!subject.ends_with("..."));
    }

    #[test]
    fn test_normalize_digits() {
        assert_eq!(
            normalize_digits("worker 1234 timed out after 30s"),
            "worker N timed out after Ns"
        );
        assert_eq!(normalize_digits("no digits here"), "no digits here");
        assert_eq!(normalize_digits("42"), "N");
    }

    #[test]
    fn test_normalization_applies_to_whole_subject() {
        let opts = SubjectOptions {
            normalize_digits: true,
            correlation: Some("jobs#retry_503".to_string()),
            ..base_opts()
        };
        let subject = compose("HttpError", "status 502 from host 10.0.0.7", &opts);
        assert_eq!(
            subject,
            "[ERROR] jobs#retry_N (HttpError) \"status N from host N.N.N.N\""
        );
    }
}
