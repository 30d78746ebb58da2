//! Numeric series utilities
//!
//! Shared building blocks over `&[f64]`: moments, interpolated quantiles,
//! IQR outlier fencing and z-scores. Quantiles use linear interpolation
//! over the sorted sample.

/// Multiplier on the IQR for outlier fences; only extreme values are
/// flagged.
pub const IQR_FENCE_MULTIPLIER: f64 = 3.0;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Quantile of a pre-sorted sample, `q` in [0, 1], linear interpolation.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;
    if base + 1 < sorted.len() {
        sorted[base] + rest * (sorted[base + 1] - sorted[base])
    } else {
        sorted[base]
    }
}

pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted_copy(values), q)
}

/// Outlier fences at Q1 - 3*IQR and Q3 + 3*IQR.
///
/// Returns `None` for degenerate samples (IQR <= 0), in which case no
/// value is considered an outlier.
pub fn outlier_fences(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return None;
    }
    Some((
        q1 - IQR_FENCE_MULTIPLIER * iqr,
        q3 + IQR_FENCE_MULTIPLIER * iqr,
    ))
}

/// Per-value outlier mask against the 3x IQR fences; all-false when the
/// fences are degenerate.
pub fn outlier_mask(values: &[f64]) -> Vec<bool> {
    match outlier_fences(values) {
        Some((lo, hi)) => values.iter().map(|&v| v < lo || v > hi).collect(),
        None => vec![false; values.len()],
    }
}

/// Z-scores against the sample mean and standard deviation; all-zero when
/// the standard deviation is degenerate.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let sd = std_dev(values);
    if !sd.is_finite() || sd == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| (v - m) / sd).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let v = [2.0, 4.0, 6.0];
        assert!((mean(&v) - 4.0).abs() < 1e-12);
        assert!((variance(&v) - 4.0).abs() < 1e-12);
        assert!((std_dev(&v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&v, 1.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_outlier_mask_flags_extremes() {
        let mut v: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        v.push(1000.0);
        let mask = outlier_mask(&v);
        assert!(mask[20]);
        assert!(mask[..20].iter().all(|&m| !m));
    }

    #[test]
    fn test_outlier_mask_degenerate() {
        let v = [5.0, 5.0, 5.0, 5.0];
        assert!(outlier_mask(&v).iter().all(|&m| !m));
    }

    #[test]
    fn test_zscores_degenerate() {
        assert!(zscores(&[3.0, 3.0]).iter().all(|&z| z == 0.0));
    }
}
