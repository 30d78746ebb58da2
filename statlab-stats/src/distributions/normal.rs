//! Normal distribution functions

use std::f64::consts::PI;

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF using the error function
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function approximation (Abramowitz & Stegun 7.1.26)
pub fn erf(x: f64) -> f64 {
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

/// Standard normal inverse using rational approximation, refined by
/// Newton-Raphson against the CDF.
pub fn norm_inv(p: f64) -> f64 {
    debug_assert!(p > 0.0 && p < 1.0);

    const A: [f64; 3] = [2.515517, 0.802853, 0.010328];
    const B: [f64; 4] = [1.0, 1.432788, 0.189269, 0.001308];

    let sign = if p < 0.5 { -1.0 } else { 1.0 };
    let p_adj = if p < 0.5 { p } else { 1.0 - p };

    let t = (-2.0 * p_adj.ln()).sqrt();
    let num = A[0] + t * (A[1] + t * A[2]);
    let den = 1.0 + t * (B[1] + t * (B[2] + t * B[3]));
    let mut x = sign * (t - num / den);

    // Two Newton steps against the CDF tighten the rational approximation
    for _ in 0..2 {
        let pdf = norm_pdf(x);
        if pdf < 1e-300 {
            break;
        }
        x -= (norm_cdf(x) - p) / pdf;
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_zero() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cdf_tails() {
        assert!(norm_cdf(-8.0) < 1e-10);
        assert!(norm_cdf(8.0) > 1.0 - 1e-10);
    }

    #[test]
    fn test_inv_known_quantiles() {
        assert!((norm_inv(0.975) - 1.959964).abs() < 1e-4);
        assert!((norm_inv(0.8) - 0.841621).abs() < 1e-4);
        assert!((norm_inv(0.5)).abs() < 1e-6);
        assert!((norm_inv(0.025) + 1.959964).abs() < 1e-4);
    }

    #[test]
    fn test_inv_round_trip() {
        for &p in &[0.01, 0.1, 0.3, 0.5, 0.7, 0.9, 0.99] {
            assert!((norm_cdf(norm_inv(p)) - p).abs() < 1e-6);
        }
    }
}
