//! Numerical transforms behind the rejection-inversion sampler.
//!
//! `h(x) = x^-q` is the hat function and `H` its antiderivative, shifted so
//! `H(1) = 0`:
//!
//! ```text
//! H(x) = (x^(1 - q) - 1) / (1 - q)    q != 1
//! H(x) = ln(x)                        q == 1
//! ```
//!
//! Both branches are evaluated through one expression built on
//! [`exp_term`], which removes the singularity at `q = 1`.

/// Below this magnitude the helpers switch to their Taylor series.
const SERIES_THRESHOLD: f64 = 1e-8;

/// `ln(1 + x) / x`, for `x >= -1`.
#[inline]
pub(crate) fn log_term(x: f64) -> f64 {
    if x.abs() > SERIES_THRESHOLD {
        x.ln_1p() / x
    } else {
        1.0 - x * (0.5 - x * (1.0 / 3.0 - 0.25 * x))
    }
}

/// `(e^x - 1) / x`, or `1` at `x = 0`.
#[inline]
pub(crate) fn exp_term(x: f64) -> f64 {
    if x.abs() > SERIES_THRESHOLD {
        x.exp_m1() / x
    } else {
        1.0 + x * 0.5 * (1.0 + x / 3.0 * (1.0 + 0.25 * x))
    }
}

/// `H(x)`, the integral of [`h`].
#[inline]
pub(crate) fn h_integral(x: f64, exponent: f64) -> f64 {
    let log_x = x.ln();
    exp_term((1.0 - exponent) * log_x) * log_x
}

/// `h(x) = 1 / x^exponent`.
#[inline]
pub(crate) fn h(x: f64, exponent: f64) -> f64 {
    (-exponent * x.ln()).exp()
}

/// Inverse of [`h_integral`]: the `y` for which `H(y) = x`.
#[inline]
pub(crate) fn h_integral_inv(x: f64, exponent: f64) -> f64 {
    let mut t = x * (1.0 - exponent);
    // Rounding can push t just below -1, outside the domain of ln(1 + t).
    if t < -1.0 {
        t = -1.0;
    }
    (log_term(t) * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_diff(a: f64, b: f64) -> f64 {
        ((a - b) / b).abs()
    }

    #[test]
    fn helpers_are_exactly_one_at_zero() {
        assert_eq!(log_term(0.0), 1.0);
        assert_eq!(exp_term(0.0), 1.0);
        assert_eq!(log_term(-0.0), 1.0);
        assert_eq!(exp_term(-0.0), 1.0);
    }

    #[test]
    fn helpers_continuous_across_switchover() {
        for &edge in &[SERIES_THRESHOLD, -SERIES_THRESHOLD] {
            let inside = edge * (1.0 - 1e-6);
            let outside = edge * (1.0 + 1e-6);
            assert!(rel_diff(log_term(inside), log_term(outside)) < 1e-10);
            assert!(rel_diff(exp_term(inside), exp_term(outside)) < 1e-10);

            // Series and direct formula agree at the boundary itself.
            let series_log = 1.0 - edge * (0.5 - edge * (1.0 / 3.0 - 0.25 * edge));
            let series_exp = 1.0 + edge * 0.5 * (1.0 + edge / 3.0 * (1.0 + 0.25 * edge));
            assert!(rel_diff(edge.ln_1p() / edge, series_log) < 1e-10);
            assert!(rel_diff(edge.exp_m1() / edge, series_exp) < 1e-10);
        }
    }

    #[test]
    fn helpers_match_closed_forms_away_from_zero() {
        for &x in &[-0.9, -0.5, 0.1, 1.0, 3.0, 20.0] {
            assert!(rel_diff(log_term(x), (1.0 + x).ln() / x) < 1e-12);
            assert!(rel_diff(exp_term(x), (x.exp() - 1.0) / x) < 1e-12);
        }
    }

    #[test]
    fn h_integral_is_zero_at_one() {
        for &q in &[0.1, 0.5, 1.0, 1.5, 4.0] {
            assert_eq!(h_integral(1.0, q), 0.0);
        }
    }

    #[test]
    fn h_integral_reduces_to_log_at_unit_exponent() {
        for &x in &[1.5, 2.0, 10.5, 1e6] {
            assert!(rel_diff(h_integral(x, 1.0), x.ln()) < 1e-15);
        }
    }

    #[test]
    fn h_integral_matches_power_form() {
        for &q in &[0.3, 1.5, 2.0, 3.7] {
            for &x in &[1.5f64, 2.5, 7.0, 100.5] {
                let expected = (x.powf(1.0 - q) - 1.0) / (1.0 - q);
                assert!(rel_diff(h_integral(x, q), expected) < 1e-12);
            }
        }
    }

    #[test]
    fn h_is_power_law() {
        assert!(rel_diff(h(2.0, 1.0), 0.5) < 1e-15);
        assert!(rel_diff(h(4.0, 0.5), 0.5) < 1e-15);
        assert!(rel_diff(h(3.0, 2.0), 1.0 / 9.0) < 1e-15);
    }

    #[test]
    fn inverse_round_trips() {
        for &q in &[0.05, 0.5, 1.0, 1.0 + 1e-10, 1.5, 3.0] {
            for &x in &[1.0, 1.5, 2.0, 10.5, 1000.5] {
                let y = h_integral_inv(h_integral(x, q), q);
                assert!(rel_diff(y, x) < 1e-9, "q={q} x={x} y={y}");
            }
        }
    }

    #[test]
    fn inverse_clamps_argument_below_minus_one() {
        // For q = 2, H(x) = 1 - 1/x tends to 1; beyond it t < -1 and the
        // clamp sends the inverse to infinity rather than NaN.
        let y = h_integral_inv(1.5, 2.0);
        assert!(!y.is_nan());
        assert!(y.is_infinite());
    }
}
