//! Logistic regression by iteratively reweighted least squares
//!
//! Binary outcome, intercept always included. Classification metrics use
//! the 0.5 probability threshold; the ROC curve sweeps every distinct
//! predicted probability plus both boundary thresholds.

use crate::regression::design_matrix;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statlab_core::{Dataset, StatError, StatResult};
use std::collections::BTreeMap;

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-8;
const PROB_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
    pub auc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogisticFit {
    pub n: usize,
    pub x_cols: Vec<String>,
    pub y_col: String,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    pub odds_ratios: BTreeMap<String, f64>,
    pub probabilities: Vec<f64>,
    pub y_true: Vec<u8>,
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc: RocCurve,
    pub converged: bool,
}

/// Fit a logistic model of a binary `y_col` on `x_cols`.
pub fn fit(dataset: &Dataset, x_cols: &[String], y_col: &str) -> StatResult<LogisticFit> {
    if x_cols.is_empty() {
        return Err(StatError::MissingParameter(
            "select at least one predictor column".into(),
        ));
    }

    let mut selected: Vec<String> = vec![y_col.to_string()];
    selected.extend(x_cols.iter().cloned());
    let mut aligned = dataset.aligned_numeric(&selected)?;
    let y_raw = aligned.remove(0);
    let x_values = aligned;

    let n = y_raw.len();
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

    let mut labels = Vec::with_capacity(n);
    for &v in &y_raw {
        if v == 0.0 {
            labels.push(0u8);
        } else if v == 1.0 {
            labels.push(1u8);
        } else {
            return Err(StatError::InvalidOutcome(format!(
                "outcome column '{}' must contain only 0 and 1, found {}",
                y_col, v
            )));
        }
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == n {
        return Err(StatError::InvalidOutcome(format!(
            "outcome column '{}' contains a single class; both 0 and 1 are required",
            y_col
        )));
    }

    let x = design_matrix(&x_values, n);
    let y = DVector::from_iterator(n, labels.iter().map(|&l| l as f64));
    let (beta, converged) = irls(&x, &y)?;

    let probabilities: Vec<f64> = (&x * &beta).iter().map(|&eta| sigmoid(eta)).collect();

    let mut coefficients = BTreeMap::new();
    let mut odds_ratios = BTreeMap::new();
    for (j, name) in x_cols.iter().enumerate() {
        coefficients.insert(name.clone(), beta[j + 1]);
        odds_ratios.insert(name.clone(), beta[j + 1].exp());
    }

    let confusion_matrix = confusion_at(&probabilities, &labels, 0.5);
    let ConfusionMatrix { tp, tn, fp, fn_ } = confusion_matrix;
    let total = tp + tn + fp + fn_;
    let accuracy = ratio(tp + tn, total);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);

    Ok(LogisticFit {
        n,
        x_cols: x_cols.to_vec(),
        y_col: y_col.to_string(),
        intercept: beta[0],
        coefficients,
        odds_ratios,
        roc: roc_curve(&probabilities, &labels),
        probabilities,
        y_true: labels,
        confusion_matrix,
        accuracy,
        precision,
        recall,
        converged,
    })
}

fn sigmoid(eta: f64) -> f64 {
    1.0 / (1.0 + (-eta).exp())
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Newton-Raphson / IRLS iterations. Separable data never converges;
/// iteration stops with the partial fit once at least one step has
/// succeeded.
fn irls(x: &DMatrix<f64>, y: &DVector<f64>) -> StatResult<(DVector<f64>, bool)> {
    let n = x.nrows();
    let k = x.ncols();
    let mut beta = DVector::zeros(k);

    for iteration in 0..MAX_ITERATIONS {
        let eta = x * &beta;
        let mu: DVector<f64> =
            eta.map(|e| sigmoid(e).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR));
        let w = DMatrix::from_diagonal(&mu.map(|m| m * (1.0 - m)));

        let hessian = x.transpose() * &w * x;
        let gradient = x.transpose() * (y - &mu);

        let delta = match hessian.lu().solve(&gradient) {
            Some(d) => d,
            None if iteration > 0 => return Ok((beta, false)),
            None => {
                return Err(StatError::ComputationFailure(
                    "weighted design matrix is singular".into(),
                ))
            }
        };

        beta += &delta;
        if delta.amax() < TOLERANCE {
            return Ok((beta, true));
        }
        // Guard against runaway coefficients on separable data
        if beta.amax() > 1e6 * (n as f64) {
            return Ok((beta, false));
        }
    }

    Ok((beta, false))
}

fn confusion_at(probabilities: &[f64], labels: &[u8], threshold: f64) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix {
        tp: 0,
        tn: 0,
        fp: 0,
        fn_: 0,
    };
    for (&p, &actual) in probabilities.iter().zip(labels) {
        let predicted = if p >= threshold { 1 } else { 0 };
        match (predicted, actual) {
            (1, 1) => cm.tp += 1,
            (0, 0) => cm.tn += 1,
            (1, 0) => cm.fp += 1,
            (0, 1) => cm.fn_ += 1,
            _ => unreachable!(),
        }
    }
    cm
}

/// ROC curve over every distinct predicted probability plus the boundary
/// thresholds 1.0 and 0.0, sorted by decreasing threshold; AUC by the
/// trapezoidal rule.
fn roc_curve(probabilities: &[f64], labels: &[u8]) -> RocCurve {
    let mut thresholds: Vec<f64> = probabilities.to_vec();
    thresholds.push(1.0);
    thresholds.push(0.0);
    thresholds.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    thresholds.dedup();

    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;

    let mut fpr = Vec::with_capacity(thresholds.len());
    let mut tpr = Vec::with_capacity(thresholds.len());
    for &t in &thresholds {
        let cm = confusion_at(probabilities, labels, t);
        fpr.push(ratio(cm.fp, negatives));
        tpr.push(ratio(cm.tp, positives));
    }

    let mut auc = 0.0;
    for i in 1..fpr.len() {
        auc += (fpr[i] - fpr[i - 1]) * (tpr[i] + tpr[i - 1]) / 2.0;
    }

    RocCurve {
        fpr,
        tpr,
        thresholds,
        auc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statlab_core::Dataset;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_separable_data_perfect_auc() {
        let ds = dataset("x,y\n1,0\n2,0\n3,0\n4,0\n5,1\n6,1\n7,1\n8,1\n");
        let fit = fit(&ds, &["x".to_string()], "y").unwrap();

        assert!((fit.roc.auc - 1.0).abs() < 1e-9);
        assert_eq!(fit.confusion_matrix.fp, 0);
        assert_eq!(fit.confusion_matrix.fn_, 0);
        assert!((fit.accuracy - 1.0).abs() < 1e-12);
        assert!(fit.coefficients["x"] > 0.0);
    }

    #[test]
    fn test_constant_probability_auc_is_half() {
        let probs = vec![0.5; 8];
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let roc = roc_curve(&probs, &labels);
        assert!((roc.auc - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_binary_outcome() {
        let ds = dataset("x,y\n1,0\n2,1\n3,2\n4,0\n");
        let err = fit(&ds, &["x".to_string()], "y").unwrap_err();
        assert!(matches!(err, StatError::InvalidOutcome(_)));
    }

    #[test]
    fn test_rejects_single_class() {
        let ds = dataset("x,y\n1,1\n2,1\n3,1\n4,1\n");
        let err = fit(&ds, &["x".to_string()], "y").unwrap_err();
        assert!(matches!(err, StatError::InvalidOutcome(_)));
    }

    #[test]
    fn test_metric_zero_denominators() {
        // Model that never predicts the positive class at threshold 0.5
        let probs = vec![0.1, 0.2, 0.3];
        let labels = vec![0, 0, 1];
        let cm = confusion_at(&probs, &labels, 0.5);
        assert_eq!(cm.tp, 0);
        assert_eq!(ratio(cm.tp, cm.tp + cm.fp), 0.0);
    }

    #[test]
    fn test_odds_ratios_exponentiate_coefficients() {
        let ds = dataset("x,y\n1,0\n2,0\n3,1\n4,0\n5,1\n6,1\n7,0\n8,1\n9,1\n10,1\n");
        let fit = fit(&ds, &["x".to_string()], "y").unwrap();
        let b = fit.coefficients["x"];
        assert!((fit.odds_ratios["x"] - b.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_overlap_auc_between_half_and_one() {
        let ds = dataset(
            "x,y\n1,0\n2,0\n3,1\n4,0\n5,1\n6,0\n7,1\n8,1\n9,0\n10,1\n11,1\n12,1\n",
        );
        let fit = fit(&ds, &["x".to_string()], "y").unwrap();
        assert!(fit.roc.auc > 0.5);
        assert!(fit.roc.auc < 1.0);
        assert!(fit.converged);
    }
}
