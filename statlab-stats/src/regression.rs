//! Ordinary least squares regression with influence and assumption
//! diagnostics
//!
//! Fits y on one or more predictors with an intercept, reporting Wald
//! t-test p-values, the overall F test, per-observation influence
//! (leverage, studentized residuals, Cook's distance) and the assumption
//! battery the client renders: Shapiro-Wilk on residuals, Breusch-Pagan,
//! Durbin-Watson and per-predictor VIF.

use crate::distributions::{chi_cdf, f_cdf, t_cdf};
use crate::goodness::{durbin_watson, shapiro_wilk, TestStatistic};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statlab_core::{Dataset, StatError, StatResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct AssumptionTests {
    pub shapiro_wilk: Option<TestStatistic>,
    pub breusch_pagan: Option<TestStatistic>,
    pub durbin_watson: f64,
    pub vif: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinearFit {
    pub n: usize,
    pub x_cols: Vec<String>,
    pub y_col: String,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    pub p_values: BTreeMap<String, f64>,
    pub std_errors: BTreeMap<String, f64>,
    pub r2: f64,
    pub r2_adj: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub y: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub standardized_residuals: Vec<f64>,
    pub leverage: Vec<f64>,
    pub cooks_distance: Vec<f64>,
    pub x_data: BTreeMap<String, Vec<f64>>,
    pub x_means: BTreeMap<String, f64>,
    pub assumption_tests: AssumptionTests,
}

/// Core least-squares solution, shared by the public fit, the auxiliary
/// regressions (Breusch-Pagan, VIF) and cross-validation.
pub(crate) struct OlsCore {
    pub beta: DVector<f64>,
    pub xtx_inv: DMatrix<f64>,
    pub fitted: DVector<f64>,
    pub residuals: DVector<f64>,
    pub sse: f64,
    pub sst: f64,
    pub r2: f64,
}

pub(crate) fn solve_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> StatResult<OlsCore> {
    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let xtx_inv = xtx.try_inverse().ok_or_else(|| {
        StatError::ComputationFailure(
            "design matrix is singular; remove collinear predictors".into(),
        )
    })?;
    let beta = &xtx_inv * xty;
    let fitted = x * &beta;
    let residuals = y - &fitted;
    let sse = residuals.dot(&residuals);
    let y_mean = y.mean();
    let sst = y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>();
    let r2 = if sst > 0.0 { 1.0 - sse / sst } else { 0.0 };
    Ok(OlsCore {
        beta,
        xtx_inv,
        fitted,
        residuals,
        sse,
        sst,
        r2,
    })
}

/// Build the design matrix with a leading intercept column.
pub(crate) fn design_matrix(predictors: &[Vec<f64>], n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, predictors.len() + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            predictors[j - 1][i]
        }
    })
}

/// Fit an OLS model of `y_col` on `x_cols` with an intercept.
///
/// Rows with a missing or non-numeric cell in any selected column are
/// dropped before fitting.
pub fn fit(dataset: &Dataset, x_cols: &[String], y_col: &str) -> StatResult<LinearFit> {
    if x_cols.is_empty() {
        return Err(StatError::MissingParameter(
            "select at least one predictor column".into(),
        ));
    }

    let mut selected: Vec<String> = vec![y_col.to_string()];
    selected.extend(x_cols.iter().cloned());
    let mut aligned = dataset.aligned_numeric(&selected)?;
    let y_values = aligned.remove(0);
    let x_values = aligned;

    let n = y_values.len();
    let p = x_cols.len();
    if n == 0 {
        return Err(StatError::InsufficientData(
            "no rows remain after dropping missing values".into(),
        ));
    }
    if n <= p + 1 {
        return Err(StatError::InsufficientData(format!(
            "{} usable rows is not enough to fit {} predictors with an intercept",
            n, p
        )));
    }

    let x = design_matrix(&x_values, n);
    let y = DVector::from_vec(y_values.clone());
    let core = solve_ols(&x, &y)?;

    let df_resid = (n - p - 1) as f64;
    let mse = core.sse / df_resid;
    let r2_adj = 1.0 - (1.0 - core.r2) * (n as f64 - 1.0) / df_resid;

    // Overall F test
    let ssr = core.sst - core.sse;
    let f_statistic = if mse > 0.0 {
        (ssr / p as f64) / mse
    } else {
        f64::INFINITY
    };
    let f_p_value = if f_statistic.is_finite() {
        (1.0 - f_cdf(f_statistic, p as f64, df_resid)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // Wald t-tests on the slope coefficients
    let mut coefficients = BTreeMap::new();
    let mut p_values = BTreeMap::new();
    let mut std_errors = BTreeMap::new();
    for (j, name) in x_cols.iter().enumerate() {
        let b = core.beta[j + 1];
        let se = (mse * core.xtx_inv[(j + 1, j + 1)]).max(0.0).sqrt();
        let p_value = if se > 0.0 {
            2.0 * (1.0 - t_cdf((b / se).abs(), df_resid))
        } else {
            0.0
        };
        coefficients.insert(name.clone(), b);
        std_errors.insert(name.clone(), se);
        p_values.insert(name.clone(), p_value.clamp(0.0, 1.0));
    }

    let Influence {
        leverage,
        standardized_residuals,
        cooks_distance,
    } = influence_stats(&x, &core, mse);

    let residuals: Vec<f64> = core.residuals.iter().cloned().collect();
    let assumption_tests = AssumptionTests {
        shapiro_wilk: shapiro_wilk(&residuals),
        breusch_pagan: breusch_pagan(&x, &residuals, p),
        durbin_watson: durbin_watson(&residuals),
        vif: vif_table(x_cols, &x_values, n),
    };

    let mut x_data = BTreeMap::new();
    let mut x_means = BTreeMap::new();
    for (name, values) in x_cols.iter().zip(&x_values) {
        x_means.insert(name.clone(), statlab_core::series::mean(values));
        x_data.insert(name.clone(), values.clone());
    }

    Ok(LinearFit {
        n,
        x_cols: x_cols.to_vec(),
        y_col: y_col.to_string(),
        intercept: core.beta[0],
        coefficients,
        p_values,
        std_errors,
        r2: core.r2,
        r2_adj,
        f_statistic,
        f_p_value,
        y: y_values,
        fitted: core.fitted.iter().cloned().collect(),
        residuals,
        standardized_residuals,
        leverage,
        cooks_distance,
        x_data,
        x_means,
        assumption_tests,
    })
}

/// Per-observation influence measures: hat diagonal, internally
/// studentized residuals and Cook's distance.
pub(crate) struct Influence {
    pub leverage: Vec<f64>,
    pub standardized_residuals: Vec<f64>,
    pub cooks_distance: Vec<f64>,
}

pub(crate) fn influence_stats(x: &DMatrix<f64>, core: &OlsCore, mse: f64) -> Influence {
    let n = x.nrows();
    let k = x.ncols() as f64;
    let mut leverage = Vec::with_capacity(n);
    let mut standardized_residuals = Vec::with_capacity(n);
    let mut cooks_distance = Vec::with_capacity(n);
    for i in 0..n {
        let row = x.row(i);
        let h = (row * &core.xtx_inv * row.transpose())[(0, 0)];
        let one_minus_h = (1.0 - h).max(1e-12);
        let e = core.residuals[i];
        let r = e / (mse * one_minus_h).sqrt();
        leverage.push(h);
        standardized_residuals.push(r);
        cooks_distance.push(r * r * h / (k * one_minus_h));
    }
    Influence {
        leverage,
        standardized_residuals,
        cooks_distance,
    }
}

/// Breusch-Pagan LM test: regress squared residuals on the design matrix,
/// LM = n * R² of the auxiliary fit, chi-squared with p degrees of freedom.
pub(crate) fn breusch_pagan(
    x: &DMatrix<f64>,
    residuals: &[f64],
    p: usize,
) -> Option<TestStatistic> {
    let n = residuals.len();
    let e2 = DVector::from_iterator(n, residuals.iter().map(|e| e * e));
    let aux = solve_ols(x, &e2).ok()?;
    if aux.sst <= 0.0 {
        return None;
    }
    let lm = n as f64 * aux.r2;
    Some(TestStatistic {
        statistic: lm,
        p_value: (1.0 - chi_cdf(lm, p as f64)).clamp(0.0, 1.0),
    })
}

/// Variance inflation factors. Defined as exactly 1.0 for a single
/// predictor; otherwise each predictor is regressed on the others.
pub(crate) fn vif_table(
    x_cols: &[String],
    x_values: &[Vec<f64>],
    n: usize,
) -> BTreeMap<String, f64> {
    let mut table = BTreeMap::new();
    if x_cols.len() == 1 {
        table.insert(x_cols[0].clone(), 1.0);
        return table;
    }

    for (j, name) in x_cols.iter().enumerate() {
        let others: Vec<Vec<f64>> = x_values
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != j)
            .map(|(_, v)| v.clone())
            .collect();
        let x = design_matrix(&others, n);
        let y = DVector::from_vec(x_values[j].clone());
        let vif = match solve_ols(&x, &y) {
            Ok(aux) => 1.0 / (1.0 - aux.r2).max(1e-12),
            Err(_) => f64::NAN,
        };
        table.insert(name.clone(), vif);
    }
    table
}
