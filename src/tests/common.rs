// src/tests/common.rs

//! Common assertions for tests.

/// Elapsed seconds are computed from nanoseconds so allow for the
/// rounding of `f64`.
pub const SECONDS_EPSILON: f64 = 1e-9;

/// Assert `actual` is within [`SECONDS_EPSILON`] of `expect`.
#[track_caller]
pub fn assert_seconds_eq(actual: f64, expect: f64) {
    assert!(
        (actual - expect).abs() < SECONDS_EPSILON,
        "expected {} seconds, got {} seconds",
        expect,
        actual,
    );
}
