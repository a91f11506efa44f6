use crate::{RestartPolicy, compare_versions};

use std::cmp::Ordering;
use std::time::Duration;

use proptest::prelude::*;

// =========================================================================
// Property-Based Tests - Restart budget
// =========================================================================

proptest! {
    #[test]
    fn given_n_increments_within_window_when_checked_then_limit_iff_n_at_least_max(
        max in 1u32..20,
        n in 0u32..40,
    ) {
        let mut policy = RestartPolicy::new(max, Duration::from_secs(3600));
        for _ in 0..n {
            policy.increment();
        }

        prop_assert_eq!(policy.count(), n);
        prop_assert_eq!(policy.limit_reached(), n >= max);
    }

    #[test]
    fn given_any_history_when_reset_then_budget_restored(max in 1u32..20, n in 0u32..40) {
        let mut policy = RestartPolicy::new(max, Duration::from_secs(3600));
        for _ in 0..n {
            policy.increment();
        }

        policy.reset();

        prop_assert_eq!(policy.count(), 0);
        prop_assert!(!policy.limit_reached());
    }
}

// =========================================================================
// Property-Based Tests - Version comparison
// =========================================================================

proptest! {
    #[test]
    fn given_same_version_when_compared_then_equal(parts in prop::collection::vec(0u64..1000, 1..5)) {
        let version = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
        prop_assert_eq!(compare_versions(&version, &version), Ordering::Equal);
    }

    #[test]
    fn given_two_versions_when_compared_both_ways_then_antisymmetric(
        a in prop::collection::vec(0u64..50, 1..4),
        b in prop::collection::vec(0u64..50, 1..4),
    ) {
        let a = a.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
        let b = b.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
        prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
    }
}
