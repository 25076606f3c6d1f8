//! Absolute tolerance used for the handful of floating-point comparisons
//! this otherwise exact-arithmetic engine cannot avoid.

use ordered_float::NotNan;
use std::ops::Deref;

/// A positive absolute tolerance.
///
/// ```
/// use laxis::ATol;
/// let atol = ATol::default();
/// assert!(*atol > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ATol(NotNan<f64>);

impl Default for ATol {
    fn default() -> Self {
        // Safe: 1e-6 is finite and not NaN.
        ATol(NotNan::new(1e-6).unwrap())
    }
}

impl Deref for ATol {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ATol {
    /// Build a tolerance, panicking if `value` is not a positive finite number.
    ///
    /// There is no user-reachable path that constructs an invalid `ATol` from
    /// untrusted input (callers pass compile-time constants), so this is a
    /// plain assertion rather than a `Result`.
    pub fn new(value: f64) -> Self {
        assert!(value > 0.0 && value.is_finite(), "ATol must be positive and finite: {value}");
        ATol(NotNan::new(value).unwrap())
    }

    pub fn into_inner(self) -> f64 {
        self.0.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_small_and_positive() {
        let atol = ATol::default();
        assert!(*atol > 0.0);
        assert!(*atol < 1e-3);
    }

    #[test]
    #[should_panic]
    fn rejects_non_positive() {
        ATol::new(0.0);
    }
}
