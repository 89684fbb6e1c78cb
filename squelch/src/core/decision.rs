//! The admit/deny policy
//!
//! [`decide`] is a pure function over the existing record, its age, and the
//! configured limits. It never fails: every occurrence resolves to admit or
//! deny plus the record's next state. Storage concerns (locking, atomic
//! writes) live in [`super::store`]; the policy knows nothing about them.

use std::time::Duration;

use super::record::ThrottleRecord;

/// Process-wide throttle limits, fixed-window count limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleLimits {
    /// Maximum admitted notifications per window
    pub count_limit: u32,
    /// Quiet time after which the counter resets
    pub window: Duration,
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        ThrottleLimits {
            count_limit: 5,
            window: Duration::from_secs(30 * 60),
        }
    }
}

/// Outcome of the policy: whether to admit, and the record's next state
#[derive(Debug, Clone)]
pub struct Decision {
    /// Send the notification (true) or suppress it (false)
    pub admit: bool,
    /// Record to persist, whichever way the decision went
    pub next: ThrottleRecord,
}

/// Decide whether an occurrence is admitted
///
/// - No existing record: admit, counter seeded at zero.
/// - Record aged past the window: the window expired — admit and reset the
///   counter, exactly as a first-ever occurrence.
/// - Record still fresh: increment the counter; the first `count_limit`
///   occurrences in a window are admitted, the rest suppressed.
///
/// `age` is `None` when no record exists on storage, which reads as
/// infinitely aged. `seed` carries the subject and sample frames of the
/// current occurrence; its counter value is ignored.
pub fn decide(
    existing: Option<ThrottleRecord>,
    age: Option<Duration>,
    seed: ThrottleRecord,
    limits: ThrottleLimits,
) -> Decision {
    let fresh = match (&existing, age) {
        (Some(_), Some(age)) => age < limits.window,
        _ => false,
    };

    if !fresh {
        return Decision {
            admit: true,
            next: seed.with_count(0),
        };
    }

    let count = existing.map(|r| r.count).unwrap_or(0) + 1;
    Decision {
        admit: count < limits.count_limit,
        next: seed.with_count(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> ThrottleRecord {
        ThrottleRecord::new("[ERROR] (E) \"m\"".to_string(), vec![])
    }

    fn limits(count_limit: u32, window_secs: u64) -> ThrottleLimits {
        ThrottleLimits {
            count_limit,
            window: Duration::from_secs(window_secs),
        }
    }

    #[test]
    fn test_first_occurrence_admitted() {
        let decision = decide(None, None, seed(), limits(5, 1800));
        assert!(decision.admit);
        assert_eq!(decision.next.count, 0);
    }

    #[test]
    fn test_fresh_record_increments() {
        let existing = seed().with_count(0);
        let decision = decide(
            Some(existing),
            Some(Duration::from_secs(10)),
            seed(),
            limits(5, 1800),
        );
        assert!(decision.admit);
        assert_eq!(decision.next.count, 1);
    }

    #[test]
    fn test_suppression_at_limit() {
        // With count_limit 5 the record saved by the fifth admitted
        // occurrence carries count 4; the sixth increments to 5 and is
        // suppressed.
        let existing = seed().with_count(4);
        let decision = decide(
            Some(existing),
            Some(Duration::from_secs(10)),
            seed(),
            limits(5, 1800),
        );
        assert!(!decision.admit);
        assert_eq!(decision.next.count, 5);
    }

    #[test]
    fn test_counter_keeps_tracking_suppressed_volume() {
        let existing = seed().with_count(17);
        let decision = decide(
            Some(existing),
            Some(Duration::from_secs(10)),
            seed(),
            limits(5, 1800),
        );
        assert!(!decision.admit);
        assert_eq!(decision.next.count, 18);
    }

    #[test]
    fn test_expired_window_resets() {
        let existing = seed().with_count(42);
        let decision = decide(
            Some(existing),
            Some(Duration::from_secs(1800)),
            seed(),
            limits(5, 1800),
        );
        assert!(decision.admit);
        assert_eq!(decision.next.count, 0);
    }

    #[test]
    fn test_age_exactly_at_window_counts_as_expired() {
        let existing = seed().with_count(3);
        let decision = decide(
            Some(existing),
            Some(Duration::from_secs(60)),
            seed(),
            limits(5, 60),
        );
        assert!(decision.admit);
        assert_eq!(decision.next.count, 0);
    }

    #[test]
    fn test_exactly_limit_admitted_per_window() {
        let limits = limits(5, 1800);
        let mut record: Option<ThrottleRecord> = None;
        let mut admitted = 0;

        for _ in 0..20 {
            let age = record.as_ref().map(|_| Duration::from_secs(1));
            let decision = decide(record.clone(), age, seed(), limits);
            if decision.admit {
                admitted += 1;
            }
            record = Some(decision.next);
        }

        assert_eq!(admitted, 5);
        assert_eq!(record.unwrap().count, 19);
    }

    #[test]
    fn test_seed_count_is_ignored() {
        let decision = decide(None, None, seed().with_count(99), limits(5, 1800));
        assert_eq!(decision.next.count, 0);
    }
}
