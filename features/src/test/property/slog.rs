//! Algebraic properties of the signed-log transform.

use proptest::prelude::*;

use crate::emit::slog;

proptest! {
    #[test]
    fn slog_is_odd(x in -1e30f32..1e30f32) {
        prop_assert_eq!(slog(-x), -slog(x));
    }

    #[test]
    fn slog_is_monotone(a in -1e30f32..1e30f32, b in -1e30f32..1e30f32) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(slog(lo) <= slog(hi));
    }

    #[test]
    fn slog_is_finite_on_finite_input(x in -1e30f32..1e30f32) {
        prop_assert!(slog(x).is_finite());
    }
}

#[test]
fn slog_zero_is_zero() {
    assert_eq!(slog(0.0), 0.0);
}
