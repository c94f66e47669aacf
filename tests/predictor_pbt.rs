//! Property-based tests for the difficulty predictor:
//! - the label is monotonically non-decreasing in score for fixed time and
//!   attempts (including around the 0.45/0.75 readiness boundaries)
//! - faster answers and fewer retries never lower the label
//! - arbitrary inputs never panic and always map into the three labels

use proptest::prelude::*;

use learnsphere_backend_rust::services::difficulty::{predict_level, Difficulty};

fn arb_score() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 100.0)
}

fn arb_time() -> impl Strategy<Value = f64> {
    (0u64..=3000u64).prop_map(|v| v as f64 / 100.0)
}

fn arb_attempts() -> impl Strategy<Value = u32> {
    1u32..=10
}

proptest! {
    #[test]
    fn monotone_in_score(
        s1 in arb_score(),
        s2 in arb_score(),
        time in arb_time(),
        attempts in arb_attempts(),
    ) {
        let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
        prop_assert!(predict_level(lo, time, attempts) <= predict_level(hi, time, attempts));
    }

    #[test]
    fn faster_never_lowers_the_label(
        score in arb_score(),
        t1 in arb_time(),
        t2 in arb_time(),
        attempts in arb_attempts(),
    ) {
        let (fast, slow) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        prop_assert!(predict_level(score, fast, attempts) >= predict_level(score, slow, attempts));
    }

    #[test]
    fn fewer_retries_never_lower_the_label(
        score in arb_score(),
        time in arb_time(),
        a1 in arb_attempts(),
        a2 in arb_attempts(),
    ) {
        let (few, many) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
        prop_assert!(predict_level(score, time, few) >= predict_level(score, time, many));
    }

    #[test]
    fn never_panics_on_wild_inputs(
        score in prop::num::f64::ANY,
        time in prop::num::f64::ANY,
        attempts in prop::num::u32::ANY,
    ) {
        let level = predict_level(score, time, attempts);
        prop_assert!(matches!(
            level,
            Difficulty::Easy | Difficulty::Medium | Difficulty::Hard
        ));
    }
}
