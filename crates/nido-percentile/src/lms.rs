//! LMS z-score math and the standard-normal CDF.
//!
//! ```text
//! z = ((value/M)^L − 1) / (L·S)      when |L| ≥ ε
//! z = ln(value/M) / S                when |L| < ε
//! percentile = Φ(z) × 100
//! ```

use nido_core::constants::LMS_EPSILON;

/// Z-score of `value` against the (L, M, S) reference row.
///
/// Returns `None` for degenerate inputs (`value ≤ 0`, `M ≤ 0`, `S ≤ 0`)
/// instead of producing NaN; the caller surfaces these as an explicit error.
pub fn zscore(value: f64, l: f64, m: f64, s: f64) -> Option<f64> {
    if value <= 0.0 || m <= 0.0 || s <= 0.0 {
        return None;
    }
    if l.abs() < LMS_EPSILON {
        Some((value / m).ln() / s)
    } else {
        Some(((value / m).powf(l) - 1.0) / (l * s))
    }
}

/// Standard-normal CDF via the error function.
pub fn phi(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Percentile in [0, 100] for a z-score.
pub fn percentile_from_z(z: f64) -> f64 {
    phi(z) * 100.0
}

/// Abramowitz & Stegun 7.1.26 rational approximation of erf.
/// Maximum absolute error ~1.5e-7, far inside the 2-decimal percentile
/// rounding.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zscore_zero_at_median() {
        assert_eq!(zscore(3.5, 0.0, 3.5, 0.12), Some(0.0));
        assert_eq!(zscore(3.5, 0.35, 3.5, 0.12), Some(0.0));
    }

    #[test]
    fn log_branch_matches_power_branch_near_zero_lambda() {
        let a = zscore(4.2, 0.0, 3.5, 0.12).unwrap();
        let b = zscore(4.2, 1e-13, 3.5, 0.12).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_none_not_nan() {
        assert_eq!(zscore(0.0, 0.3, 3.5, 0.12), None);
        assert_eq!(zscore(-1.0, 0.3, 3.5, 0.12), None);
        assert_eq!(zscore(3.5, 0.3, 0.0, 0.12), None);
        assert_eq!(zscore(3.5, 0.3, 3.5, 0.0), None);
    }

    #[test]
    fn phi_midpoint_and_symmetry() {
        // The A&S coefficients sum to just under 1, so erf(0) is ~1e-9,
        // not exactly zero; bound by the approximation's error, not by ulp.
        assert!((phi(0.0) - 0.5).abs() < 1e-7);
        assert!((phi(1.96) - 0.975).abs() < 1e-3);
        assert!((phi(-1.0) + phi(1.0) - 1.0).abs() < 1e-7);
    }

    #[test]
    fn percentile_bounds() {
        assert!(percentile_from_z(-10.0) >= 0.0);
        assert!(percentile_from_z(10.0) <= 100.0);
    }
}
