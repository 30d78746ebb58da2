//! Helper functions for statistical operations
//!
//! Moment-based shape statistics, correlation and confidence intervals
//! shared across the analyzers. Basic moments and quantiles live in
//! `statlab_core::series`.

use crate::distributions::t_inv;
use statlab_core::series::{mean, std_dev};

/// Adjusted Fisher skewness (the pandas/statsmodels sample estimator).
/// Returns `None` below 3 observations or for a degenerate sample.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    if m2 <= 0.0 {
        return None;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n as f64;
    let g1 = m3 / m2.powf(1.5);
    let n = n as f64;
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// Adjusted excess kurtosis (the pandas sample estimator).
/// Returns `None` below 4 observations or for a degenerate sample.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    if m2 <= 0.0 {
        return None;
    }
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    let n = n as f64;
    Some(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

/// Pearson correlation coefficient; `None` when either side is degenerate.
pub fn pearson_r(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);
    let cov: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let vx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    let vy: f64 = y.iter().map(|b| (b - my).powi(2)).sum();
    let denom = (vx * vy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(cov / denom)
}

/// Two-sided confidence interval bounds
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

/// t-based confidence interval for a sample mean.
/// Returns `None` below 2 observations.
pub fn mean_ci(values: &[f64], level: f64) -> Option<Interval> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values);
    let se = std_dev(values) / (n as f64).sqrt();
    let t_crit = t_inv(0.5 + level / 2.0, (n - 1) as f64);
    Some(Interval {
        low: m - t_crit * se,
        high: m + t_crit * se,
    })
}

/// Cohen's d from the pooled standard deviation of two groups.
/// Returns `None` when the pooled sd is degenerate.
pub fn cohens_d_pooled(a: &[f64], b: &[f64]) -> Option<f64> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    if n1 < 2.0 || n2 < 2.0 {
        return None;
    }
    let v1 = statlab_core::series::variance(a);
    let v2 = statlab_core::series::variance(b);
    let pooled = (((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0)).sqrt();
    if pooled == 0.0 || !pooled.is_finite() {
        return None;
    }
    Some((mean(a) - mean(b)) / pooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skewness_symmetric() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(skewness(&v).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_skewness_right_tail() {
        let v = [1.0, 1.0, 1.0, 2.0, 10.0];
        assert!(skewness(&v).unwrap() > 1.0);
    }

    #[test]
    fn test_skewness_degenerate() {
        assert!(skewness(&[2.0, 2.0, 2.0]).is_none());
        assert!(skewness(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson_r(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        let y_neg = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson_r(&x, &y_neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert!(pearson_r(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_mean_ci_contains_mean() {
        let v = [4.0, 5.0, 6.0, 5.0, 4.5];
        let ci = mean_ci(&v, 0.95).unwrap();
        let m = mean(&v);
        assert!(ci.low < m && m < ci.high);
    }

    #[test]
    fn test_cohens_d_sign() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let d = cohens_d_pooled(&a, &b).unwrap();
        assert!(d < -2.0);
    }
}
