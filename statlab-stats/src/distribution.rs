//! Single-column distribution analysis
//!
//! Histogram with a fitted normal overlay, Shapiro-Wilk normality check,
//! raw values for box-plot rendering, and before/after transform
//! comparisons including a maximum-likelihood Box-Cox lambda.

use crate::distributions::norm_pdf;
use crate::goodness::{shapiro_wilk, TestStatistic};
use serde::Serialize;
use statlab_core::series::{mean, std_dev};
use statlab_core::{Dataset, StatError, StatResult, Transform};

/// Caller-requested bin counts are floored at this value.
pub const MIN_BINS: usize = 5;

const CURVE_POINTS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Log,
    Sqrt,
    BoxCox,
}

impl TransformKind {
    pub fn parse(s: &str) -> StatResult<Self> {
        match s {
            "log" => Ok(TransformKind::Log),
            "sqrt" => Ok(TransformKind::Sqrt),
            "boxcox" => Ok(TransformKind::BoxCox),
            other => Err(StatError::unknown_variant("transform", other)),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TransformKind::Log => "log",
            TransformKind::Sqrt => "sqrt",
            TransformKind::BoxCox => "boxcox",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
    pub centers: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxPlot {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionSummary {
    pub column: String,
    pub n: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub histogram: Histogram,
    pub normal_curve: NormalCurve,
    pub shapiro_wilk: Option<TestStatistic>,
    pub boxplot: BoxPlot,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformResult {
    pub column: String,
    pub transform: TransformKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda: Option<f64>,
    pub before: DistributionSummary,
    pub after: DistributionSummary,
}

/// Histogram + fitted normal overlay + normality test for one numeric
/// column. Non-numeric cells are dropped by coercion.
pub fn describe(dataset: &Dataset, column: &str, bins: usize) -> StatResult<DistributionSummary> {
    let values = dataset.column(column)?.finite_values();
    if values.is_empty() {
        return Err(StatError::InsufficientData(format!(
            "column '{}' has no numeric values",
            column
        )));
    }
    Ok(summarize(column, &values, bins.max(MIN_BINS)))
}

/// Apply a transform to a numeric column and summarize the distribution
/// before and after.
pub fn transform(
    dataset: &Dataset,
    column: &str,
    kind: TransformKind,
    bins: usize,
) -> StatResult<TransformResult> {
    let values = dataset.column(column)?.finite_values();
    if values.is_empty() {
        return Err(StatError::InsufficientData(format!(
            "column '{}' has no numeric values",
            column
        )));
    }

    let (transformed, lambda) = match kind {
        TransformKind::Log => (Transform::Log.apply(&values)?, None),
        TransformKind::Sqrt => (Transform::Sqrt.apply(&values)?, None),
        TransformKind::BoxCox => {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            if min <= 0.0 {
                return Err(StatError::InvalidTransform(format!(
                    "Box-Cox transform requires all values > 0. Found minimum = {}.",
                    min
                )));
            }
            let lambda = boxcox_mle_lambda(&values);
            (boxcox_apply(&values, lambda), Some(lambda))
        }
    };

    let bins = bins.max(MIN_BINS);
    Ok(TransformResult {
        column: column.to_string(),
        transform: kind,
        lambda,
        before: summarize(column, &values, bins),
        after: summarize(&format!("{}({})", kind.label(), column), &transformed, bins),
    })
}

fn summarize(label: &str, values: &[f64], bins: usize) -> DistributionSummary {
    let n = values.len();
    let m = mean(values);
    let sd = if n >= 2 { Some(std_dev(values)) } else { None };

    let histogram = build_histogram(values, bins);
    let bin_width = histogram.edges[1] - histogram.edges[0];
    let normal_curve = match sd {
        Some(sd) if sd > 0.0 => {
            let lo = histogram.edges[0];
            let hi = histogram.edges[histogram.edges.len() - 1];
            let step = (hi - lo) / (CURVE_POINTS - 1) as f64;
            let x: Vec<f64> = (0..CURVE_POINTS).map(|i| lo + step * i as f64).collect();
            // Density scaled to the count axis: n * bin_width * pdf
            let y = x
                .iter()
                .map(|&xi| n as f64 * bin_width * norm_pdf((xi - m) / sd) / sd)
                .collect();
            NormalCurve { x, y }
        }
        _ => NormalCurve {
            x: Vec::new(),
            y: Vec::new(),
        },
    };

    DistributionSummary {
        column: label.to_string(),
        n,
        mean: m,
        std: sd,
        histogram,
        normal_curve,
        shapiro_wilk: shapiro_wilk(values),
        boxplot: BoxPlot {
            values: values.to_vec(),
        },
    }
}

fn build_histogram(values: &[f64], bins: usize) -> Histogram {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    // Constant samples still get a well-formed single-spike histogram
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let centers: Vec<f64> = (0..bins)
        .map(|i| lo + width * (i as f64 + 0.5))
        .collect();

    Histogram {
        counts,
        edges,
        centers,
    }
}

/// Box-Cox z(λ) = (x^λ - 1)/λ, with the λ→0 limit ln(x).
fn boxcox_apply(values: &[f64], lambda: f64) -> Vec<f64> {
    if lambda.abs() < 1e-8 {
        values.iter().map(|v| v.ln()).collect()
    } else {
        values
            .iter()
            .map(|v| (v.powf(lambda) - 1.0) / lambda)
            .collect()
    }
}

/// Profile log-likelihood of the Box-Cox parameter.
fn boxcox_llf(values: &[f64], lambda: f64) -> f64 {
    let z = boxcox_apply(values, lambda);
    let n = z.len() as f64;
    let zm = mean(&z);
    let var_mle = z.iter().map(|v| (v - zm).powi(2)).sum::<f64>() / n;
    if var_mle <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    -(n / 2.0) * var_mle.ln() + (lambda - 1.0) * log_sum
}

/// Maximum-likelihood λ by golden-section search over [-5, 5].
fn boxcox_mle_lambda(values: &[f64]) -> f64 {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    let mut a = -5.0;
    let mut b = 5.0;
    let mut c = b - GOLDEN * (b - a);
    let mut d = a + GOLDEN * (b - a);

    for _ in 0..100 {
        if boxcox_llf(values, c) > boxcox_llf(values, d) {
            b = d;
        } else {
            a = c;
        }
        c = b - GOLDEN * (b - a);
        d = a + GOLDEN * (b - a);
        if (b - a).abs() < 1e-8 {
            break;
        }
    }

    (a + b) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use statlab_core::Dataset;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_csv(csv.as_bytes()).unwrap()
    }

    fn csv_column(values: &[f64]) -> Dataset {
        let mut csv = String::from("x\n");
        for v in values {
            csv.push_str(&format!("{}\n", v));
        }
        dataset(&csv)
    }

    #[test]
    fn test_histogram_counts_sum_to_n() {
        let values: Vec<f64> = (1..=50).map(|i| i as f64).collect();
        let ds = csv_column(&values);
        let result = describe(&ds, "x", 10).unwrap();
        assert_eq!(result.histogram.counts.iter().sum::<usize>(), 50);
        assert_eq!(result.histogram.counts.len(), 10);
        assert_eq!(result.histogram.edges.len(), 11);
        assert_eq!(result.histogram.centers.len(), 10);
    }

    #[test]
    fn test_bins_floor() {
        let values: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let ds = csv_column(&values);
        let result = describe(&ds, "x", 2).unwrap();
        assert_eq!(result.histogram.counts.len(), MIN_BINS);
    }

    #[test]
    fn test_constant_column_histogram() {
        let ds = csv_column(&[7.0, 7.0, 7.0, 7.0, 7.0]);
        let result = describe(&ds, "x", 10).unwrap();
        assert_eq!(result.histogram.counts.iter().sum::<usize>(), 5);
        assert!(result.shapiro_wilk.is_none());
    }

    #[test]
    fn test_normal_curve_scaled_to_counts() {
        let values: Vec<f64> = (0..100).map(|i| (i % 13) as f64 + (i % 7) as f64).collect();
        let ds = csv_column(&values);
        let result = describe(&ds, "x", 10).unwrap();
        // Curve peak should be on the order of the tallest bin, not a density
        let max_count = *result.histogram.counts.iter().max().unwrap() as f64;
        let max_curve = result.normal_curve.y.iter().cloned().fold(0.0, f64::max);
        assert!(max_curve > 1.0);
        assert!(max_curve < max_count * 3.0);
    }

    #[test]
    fn test_log_transform_domain_error() {
        let ds = csv_column(&[1.0, 2.0, 0.0]);
        let err = transform(&ds, "x", TransformKind::Log, 10).unwrap_err();
        assert!(matches!(err, StatError::InvalidTransform(_)));
        assert!(err.to_string().contains("minimum = 0"));
    }

    #[test]
    fn test_boxcox_lambda_near_zero_for_log_symmetric_data() {
        // x = exp(z) with z spread symmetrically around 0: the profile
        // likelihood peaks near lambda = 0
        let values: Vec<f64> = (0..80)
            .map(|i| (((i * 37 % 101) as f64 / 101.0) * 3.0 - 1.5).exp())
            .collect();
        let ds = csv_column(&values);
        let result = transform(&ds, "x", TransformKind::BoxCox, 10).unwrap();
        let lambda = result.lambda.unwrap();
        assert!(lambda.abs() < 1.0, "lambda = {}", lambda);
        assert_eq!(result.after.n, result.before.n);
    }

    #[test]
    fn test_unknown_transform_kind() {
        assert!(matches!(
            TransformKind::parse("cube"),
            Err(StatError::UnknownVariant { .. })
        ));
    }
}
