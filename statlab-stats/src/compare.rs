//! Multi-model OLS comparison
//!
//! Fits each candidate model, reports information criteria and k-fold
//! cross-validated prediction error, then runs nested-model F-tests for
//! every strict predictor-subset pair. Fold assignment is a fixed-seed
//! permutation: reproducibility is part of the contract.

use crate::distributions::f_cdf;
use crate::regression::{design_matrix, solve_ols};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statlab_core::{Dataset, StatError, StatResult};
use std::collections::HashSet;

/// Fixed shuffle seed. Identical inputs must produce identical folds
/// across runs and platforms.
pub const CV_SEED: u64 = 42;

pub const MIN_FOLDS: usize = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub predictors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossValidation {
    pub folds: usize,
    pub mse_mean: f64,
    pub mse_std: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub id: String,
    pub predictors: Vec<String>,
    pub n: usize,
    pub r2: f64,
    pub r2_adj: f64,
    pub aic: f64,
    pub bic: f64,
    pub cv: CrossValidation,
}

#[derive(Debug, Clone, Serialize)]
pub struct NestedFTest {
    pub restricted: String,
    pub full: String,
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_diff: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResult {
    pub y_col: String,
    pub models: Vec<ModelReport>,
    pub nested_f_tests: Vec<NestedFTest>,
}

/// Compare OLS models of `y_col` over the requested predictor sets.
pub fn compare(
    dataset: &Dataset,
    models: &[ModelSpec],
    y_col: &str,
    folds: usize,
) -> StatResult<CompareResult> {
    if models.is_empty() {
        return Err(StatError::MissingParameter(
            "specify at least one model to compare".into(),
        ));
    }
    let folds = folds.max(MIN_FOLDS);

    let mut reports = Vec::with_capacity(models.len());
    for spec in models {
        reports.push(fit_model(dataset, spec, y_col, folds)?);
    }

    // Nested F-tests for every ordered strict-subset pair
    let mut nested_f_tests = Vec::new();
    for restricted in models {
        for full in models {
            if restricted.id == full.id {
                continue;
            }
            let r_set: HashSet<&String> = restricted.predictors.iter().collect();
            let f_set: HashSet<&String> = full.predictors.iter().collect();
            if !r_set.is_subset(&f_set) || r_set.len() == f_set.len() {
                continue;
            }
            if let Some(test) = nested_f_test(dataset, restricted, full, y_col)? {
                nested_f_tests.push(test);
            }
        }
    }

    Ok(CompareResult {
        y_col: y_col.to_string(),
        models: reports,
        nested_f_tests,
    })
}

fn fit_model(
    dataset: &Dataset,
    spec: &ModelSpec,
    y_col: &str,
    folds: usize,
) -> StatResult<ModelReport> {
    if spec.predictors.is_empty() {
        return Err(StatError::MissingParameter(format!(
            "model '{}' has no predictors",
            spec.id
        )));
    }

    let mut selected = vec![y_col.to_string()];
    selected.extend(spec.predictors.iter().cloned());
    let mut aligned = dataset.aligned_numeric(&selected)?;
    let y_values = aligned.remove(0);
    let x_values = aligned;

    let n = y_values.len();
    let p = spec.predictors.len();
    if n < folds {
        return Err(StatError::InsufficientData(format!(
            "model '{}' has {} usable rows, fewer than {} folds",
            spec.id, n, folds
        )));
    }
    if n <= p + 1 {
        return Err(StatError::InsufficientData(format!(
            "model '{}' has {} usable rows, not enough for {} predictors",
            spec.id, n, p
        )));
    }

    let x = design_matrix(&x_values, n);
    let y = DVector::from_vec(y_values.clone());
    let core = solve_ols(&x, &y)?;

    let df_resid = (n - p - 1) as f64;
    let r2_adj = 1.0 - (1.0 - core.r2) * (n as f64 - 1.0) / df_resid;

    // Gaussian log-likelihood based information criteria
    let nf = n as f64;
    let k = (p + 1) as f64;
    let llf = -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (core.sse / nf).ln() + 1.0);
    let aic = -2.0 * llf + 2.0 * k;
    let bic = -2.0 * llf + k * nf.ln();

    let cv = cross_validate(&x_values, &y_values, folds, spec, p)?;

    Ok(ModelReport {
        id: spec.id.clone(),
        predictors: spec.predictors.clone(),
        n,
        r2: core.r2,
        r2_adj,
        aic,
        bic,
        cv,
    })
}

/// k-fold cross-validation with a deterministic row permutation.
fn cross_validate(
    x_values: &[Vec<f64>],
    y_values: &[f64],
    folds: usize,
    spec: &ModelSpec,
    p: usize,
) -> StatResult<CrossValidation> {
    let n = y_values.len();
    let permutation = seeded_permutation(n, CV_SEED);

    // Near-equal fold sizes: the first n % folds folds get one extra row
    let base = n / folds;
    let extra = n % folds;

    let mut fold_mses = Vec::with_capacity(folds);
    let mut start = 0;
    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        let test_idx: HashSet<usize> = permutation[start..start + size].iter().copied().collect();
        start += size;

        let train_rows: Vec<usize> = (0..n).filter(|i| !test_idx.contains(i)).collect();
        if train_rows.len() <= p + 1 {
            return Err(StatError::InsufficientData(format!(
                "model '{}': training folds too small for {} predictors",
                spec.id, p
            )));
        }

        let train_x: Vec<Vec<f64>> = x_values
            .iter()
            .map(|col| train_rows.iter().map(|&i| col[i]).collect())
            .collect();
        let train_y: Vec<f64> = train_rows.iter().map(|&i| y_values[i]).collect();

        let x = design_matrix(&train_x, train_rows.len());
        let y = DVector::from_vec(train_y);
        let core = solve_ols(&x, &y)?;

        let mut sse = 0.0;
        for &i in &test_idx {
            let mut pred = core.beta[0];
            for (j, col) in x_values.iter().enumerate() {
                pred += core.beta[j + 1] * col[i];
            }
            sse += (y_values[i] - pred).powi(2);
        }
        fold_mses.push(sse / test_idx.len() as f64);
    }

    let mean = statlab_core::series::mean(&fold_mses);
    let std = if fold_mses.len() >= 2 {
        statlab_core::series::std_dev(&fold_mses)
    } else {
        0.0
    };

    Ok(CrossValidation {
        folds,
        mse_mean: mean,
        mse_std: std,
    })
}

/// F-test comparing a restricted model against a full model on the rows
/// complete for both. Returns `None` when the comparison is degenerate.
fn nested_f_test(
    dataset: &Dataset,
    restricted: &ModelSpec,
    full: &ModelSpec,
    y_col: &str,
) -> StatResult<Option<NestedFTest>> {
    let mut selected = vec![y_col.to_string()];
    selected.extend(full.predictors.iter().cloned());
    for pred in &restricted.predictors {
        if !selected.contains(pred) {
            selected.push(pred.clone());
        }
    }
    let aligned = dataset.aligned_numeric(&selected)?;
    let y_values = &aligned[0];
    let n = y_values.len();
    let p_full = full.predictors.len();
    let p_restricted = restricted.predictors.len();
    if n <= p_full + 1 {
        return Ok(None);
    }

    let column_of = |name: &String| -> Vec<f64> {
        selected
            .iter()
            .position(|s| s == name)
            .map(|idx| aligned[idx].clone())
            .unwrap_or_default()
    };

    let full_x: Vec<Vec<f64>> = full.predictors.iter().map(column_of).collect();
    let restricted_x: Vec<Vec<f64>> = restricted.predictors.iter().map(column_of).collect();

    let y = DVector::from_vec(y_values.clone());
    let rss_full = solve_ols(&design_matrix(&full_x, n), &y)?.sse;
    let rss_restricted = solve_ols(&design_matrix(&restricted_x, n), &y)?.sse;

    let df_diff = p_full - p_restricted;
    let df_resid = (n - p_full - 1) as f64;
    let denom = rss_full / df_resid;
    if denom <= 0.0 {
        return Ok(None);
    }

    let f_statistic = ((rss_restricted - rss_full) / df_diff as f64) / denom;
    let p_value = (1.0 - f_cdf(f_statistic, df_diff as f64, df_resid)).clamp(0.0, 1.0);

    Ok(Some(NestedFTest {
        restricted: restricted.id.clone(),
        full: full.id.clone(),
        f_statistic,
        p_value,
        df_diff,
    }))
}

/// Deterministic Fisher-Yates permutation driven by splitmix64.
fn seeded_permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    };

    let mut perm: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = (next() % (i as u64 + 1)) as usize;
        perm.swap(i, j);
    }
    perm
}

#[cfg(test)]
mod tests {
    use super::*;
    use statlab_core::Dataset;

    fn dataset() -> Dataset {
        let mut csv = String::from("x1,x2,noise,y\n");
        for i in 0..40 {
            let x1 = i as f64;
            let x2 = (i as f64 * 0.37).sin() * 5.0;
            let noise = ((i * 7 % 11) as f64) - 5.0;
            let y = 3.0 * x1 + 2.0 * x2 + 0.3 * noise;
            csv.push_str(&format!("{},{},{},{}\n", x1, x2, noise, y));
        }
        Dataset::from_csv(csv.as_bytes()).unwrap()
    }

    fn spec(id: &str, predictors: &[&str]) -> ModelSpec {
        ModelSpec {
            id: id.to_string(),
            predictors: predictors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_fuller_model_fits_better() {
        let ds = dataset();
        let result = compare(
            &ds,
            &[spec("m1", &["x1"]), spec("m2", &["x1", "x2"])],
            "y",
            5,
        )
        .unwrap();

        assert_eq!(result.models.len(), 2);
        let m1 = &result.models[0];
        let m2 = &result.models[1];
        assert!(m2.r2_adj > m1.r2_adj);
        assert!(m2.aic < m1.aic);
        assert!(m2.cv.mse_mean < m1.cv.mse_mean);
    }

    #[test]
    fn test_nested_f_test_detects_contribution() {
        let ds = dataset();
        let result = compare(
            &ds,
            &[spec("m1", &["x1"]), spec("m2", &["x1", "x2"])],
            "y",
            5,
        )
        .unwrap();

        assert_eq!(result.nested_f_tests.len(), 1);
        let test = &result.nested_f_tests[0];
        assert_eq!(test.restricted, "m1");
        assert_eq!(test.full, "m2");
        assert_eq!(test.df_diff, 1);
        assert!(test.p_value < 0.001);
    }

    #[test]
    fn test_no_nested_test_for_disjoint_models() {
        let ds = dataset();
        let result = compare(
            &ds,
            &[spec("m1", &["x1"]), spec("m2", &["x2"])],
            "y",
            3,
        )
        .unwrap();
        assert!(result.nested_f_tests.is_empty());
    }

    #[test]
    fn test_cv_is_reproducible() {
        let ds = dataset();
        let run1 = compare(&ds, &[spec("m", &["x1", "x2"])], "y", 4).unwrap();
        let run2 = compare(&ds, &[spec("m", &["x1", "x2"])], "y", 4).unwrap();
        assert_eq!(run1.models[0].cv.mse_mean, run2.models[0].cv.mse_mean);
        assert_eq!(run1.models[0].cv.mse_std, run2.models[0].cv.mse_std);
    }

    #[test]
    fn test_permutation_is_deterministic_and_complete() {
        let p1 = seeded_permutation(100, CV_SEED);
        let p2 = seeded_permutation(100, CV_SEED);
        assert_eq!(p1, p2);

        let mut sorted = p1.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_insufficient_rows_for_folds() {
        let csv = "x,y\n1,2\n2,4\n3,6\n";
        let ds = Dataset::from_csv(csv.as_bytes()).unwrap();
        let err = compare(&ds, &[spec("m", &["x"])], "y", 5).unwrap_err();
        assert!(matches!(err, StatError::InsufficientData(_)));
    }

    #[test]
    fn test_folds_floor_applied() {
        let ds = dataset();
        let result = compare(&ds, &[spec("m", &["x1"])], "y", 0).unwrap();
        assert_eq!(result.models[0].cv.folds, MIN_FOLDS);
    }
}
