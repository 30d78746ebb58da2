//! Goodness-of-fit and assumption tests
//!
//! Shapiro-Wilk normality (Royston's AS R94 approximation), the
//! Brown-Forsythe variant of Levene's variance-homogeneity test, and the
//! Durbin-Watson autocorrelation statistic.

use crate::distributions::{f_cdf, norm_cdf, norm_inv};
use serde::Serialize;
use statlab_core::series::{mean, quantile, sorted_copy};

/// Shapiro-Wilk is unreliable below 3 observations and the p-value
/// approximation degrades above 5000; outside that window the test is
/// skipped and reported as null.
pub const SHAPIRO_MIN_N: usize = 3;
pub const SHAPIRO_MAX_N: usize = 5000;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TestStatistic {
    pub statistic: f64,
    pub p_value: f64,
}

/// Shapiro-Wilk W test for normality (Royston 1995, AS R94).
///
/// Returns `None` when n is outside [3, 5000] or the sample is constant.
pub fn shapiro_wilk(values: &[f64]) -> Option<TestStatistic> {
    let n = values.len();
    if !(SHAPIRO_MIN_N..=SHAPIRO_MAX_N).contains(&n) {
        return None;
    }

    let x = sorted_copy(values);
    let range = x[n - 1] - x[0];
    if range <= 0.0 {
        return None;
    }

    // Expected normal order statistics
    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| norm_inv((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let m_sum_sq: f64 = m.iter().map(|v| v * v).sum();
    let rsn = 1.0 / nf.sqrt();

    // Weights: normalized order statistics with Royston's polynomial
    // corrections on the one or two extreme coefficients.
    let mut a = vec![0.0; n];
    let c_n = m[n - 1] / m_sum_sq.sqrt();
    if n > 5 {
        let c_n1 = m[n - 2] / m_sum_sq.sqrt();
        let a_n = -2.706056 * rsn.powi(5) + 4.434685 * rsn.powi(4) - 2.071190 * rsn.powi(3)
            - 0.147981 * rsn.powi(2)
            + 0.221157 * rsn
            + c_n;
        let a_n1 = -3.582633 * rsn.powi(5) + 5.682633 * rsn.powi(4) - 1.752461 * rsn.powi(3)
            - 0.293762 * rsn.powi(2)
            + 0.042981 * rsn
            + c_n1;
        let phi = (m_sum_sq - 2.0 * m[n - 1] * m[n - 1] - 2.0 * m[n - 2] * m[n - 2])
            / (1.0 - 2.0 * a_n * a_n - 2.0 * a_n1 * a_n1);
        for i in 2..n - 2 {
            a[i] = m[i] / phi.sqrt();
        }
        a[n - 1] = a_n;
        a[n - 2] = a_n1;
        a[0] = -a_n;
        a[1] = -a_n1;
    } else {
        let a_n = if n > 3 {
            -2.706056 * rsn.powi(5) + 4.434685 * rsn.powi(4) - 2.071190 * rsn.powi(3)
                - 0.147981 * rsn.powi(2)
                + 0.221157 * rsn
                + c_n
        } else {
            std::f64::consts::FRAC_1_SQRT_2
        };
        let phi = if n > 3 {
            (m_sum_sq - 2.0 * m[n - 1] * m[n - 1]) / (1.0 - 2.0 * a_n * a_n)
        } else {
            1.0
        };
        for i in 1..n - 1 {
            a[i] = m[i] / phi.sqrt();
        }
        a[n - 1] = a_n;
        a[0] = -a_n;
    }

    let xm = mean(&x);
    let numerator: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum::<f64>().powi(2);
    let denominator: f64 = x.iter().map(|xi| (xi - xm).powi(2)).sum();
    if denominator <= 0.0 {
        return None;
    }
    let w = (numerator / denominator).min(1.0);

    let p_value = shapiro_p_value(w, n);
    Some(TestStatistic {
        statistic: w,
        p_value,
    })
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    if n == 3 {
        // Exact for n = 3
        let p = 6.0 / std::f64::consts::PI
            * ((w.sqrt()).asin() - (0.75f64).sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let (z, _mu, _sigma) = if n <= 11 {
        let gamma = -2.273 + 0.459 * nf;
        let lw = -(gamma - (1.0 - w).ln()).ln();
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf * nf - 0.0006714 * nf * nf * nf;
        let sigma = (1.3822 - 0.77857 * nf + 0.062767 * nf * nf - 0.0020322 * nf * nf * nf).exp();
        ((lw - mu) / sigma, mu, sigma)
    } else {
        let ln_n = nf.ln();
        let lw = (1.0 - w).ln();
        let mu = -1.5861 - 0.31082 * ln_n - 0.083751 * ln_n * ln_n + 0.0038915 * ln_n.powi(3);
        let sigma = (-0.4803 - 0.082676 * ln_n + 0.0030302 * ln_n * ln_n).exp();
        ((lw - mu) / sigma, mu, sigma)
    };

    (1.0 - norm_cdf(z)).clamp(0.0, 1.0)
}

/// Brown-Forsythe (median-centered Levene) test for equal group variances.
///
/// Returns `None` with fewer than 2 groups or fewer than 3 total
/// observations.
pub fn levene_brown_forsythe(groups: &[Vec<f64>]) -> Option<TestStatistic> {
    let k = groups.len();
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || n_total <= k {
        return None;
    }

    // Absolute deviations from the group medians
    let z: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let med = quantile(g, 0.5);
            g.iter().map(|v| (v - med).abs()).collect()
        })
        .collect();

    let grand_mean = mean(&z.iter().flatten().cloned().collect::<Vec<_>>());
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for zg in &z {
        let gm = mean(zg);
        ss_between += zg.len() as f64 * (gm - grand_mean).powi(2);
        ss_within += zg.iter().map(|v| (v - gm).powi(2)).sum::<f64>();
    }

    let df1 = (k - 1) as f64;
    let df2 = (n_total - k) as f64;
    if ss_within <= 0.0 {
        return None;
    }
    let f = (ss_between / df1) / (ss_within / df2);
    Some(TestStatistic {
        statistic: f,
        p_value: (1.0 - f_cdf(f, df1, df2)).clamp(0.0, 1.0),
    })
}

/// Durbin-Watson statistic over an ordered residual vector.
pub fn durbin_watson(residuals: &[f64]) -> f64 {
    let denom: f64 = residuals.iter().map(|e| e * e).sum();
    if denom == 0.0 {
        return f64::NAN;
    }
    let num: f64 = residuals
        .windows(2)
        .map(|w| (w[1] - w[0]).powi(2))
        .sum();
    num / denom
}
