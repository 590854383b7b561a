use mbna::{should_refuse, trust};
use proptest::prelude::*;

proptest! {
    #[test]
    fn trust_is_positive_and_bounded_by_confidence(
        conf in 0.01f64..=1.0,
        penalty in 0.0f64..1.0e6,
        lambda in 0.01f64..10.0,
    ) {
        let t = trust(conf, penalty, lambda);
        prop_assert!(t > 0.0);
        prop_assert!(t <= conf);
    }

    #[test]
    fn trust_strictly_decreases_with_penalty(
        conf in 0.01f64..=1.0,
        penalty in 0.0f64..1.0e3,
        delta in 0.01f64..100.0,
    ) {
        prop_assert!(trust(conf, penalty + delta, 1.0) < trust(conf, penalty, 1.0));
    }

    #[test]
    fn zero_penalty_keeps_full_confidence(conf in 0.0f64..=1.0, lambda in 0.01f64..10.0) {
        prop_assert_eq!(trust(conf, 0.0, lambda), conf);
    }

    #[test]
    fn refusal_iff_strictly_above_threshold(norm in -1.0e3f64..1.0e3, threshold in 0.0f64..1.0e3) {
        prop_assert_eq!(should_refuse(norm, threshold), norm > threshold);
        prop_assert!(!should_refuse(threshold, threshold));
    }
}
