//! Dataset overview: shape, missingness, cardinality, numeric summaries,
//! correlations and screening flags
//!
//! Produces everything the overview screen renders in one pass: duplicate
//! detection, 3x IQR extreme-value counts and skew/kurtosis cues per
//! numeric column.

use crate::helpers::{excess_kurtosis, pearson_r, skewness};
use serde::Serialize;
use statlab_core::series::{mean, outlier_mask, quantile_sorted, sorted_copy, std_dev};
use statlab_core::{Dataset, StatResult};
use std::collections::BTreeMap;

/// Skew beyond this magnitude is flagged as a distribution cue.
pub const SKEW_FLAG_THRESHOLD: f64 = 0.5;

/// Excess kurtosis above this is flagged as heavy-tailed.
pub const HEAVY_TAILS_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateRows {
    pub count: usize,
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExtremeValueFlags {
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DistributionFlags {
    pub right_skewed: bool,
    pub left_skewed: bool,
    pub heavy_tails: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescribeResult {
    pub shape: Shape,
    pub columns: Vec<String>,
    pub missing_by_column: BTreeMap<String, usize>,
    pub nunique: BTreeMap<String, usize>,
    pub categorical_columns: Vec<String>,
    pub describe: BTreeMap<String, NumericSummary>,
    pub corr: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    pub duplicate_rows: DuplicateRows,
    pub extreme_value_flags: BTreeMap<String, ExtremeValueFlags>,
    pub distribution_flags: BTreeMap<String, DistributionFlags>,
}

/// Summarize a dataset for the overview screen.
pub fn describe(dataset: &Dataset) -> StatResult<DescribeResult> {
    let columns = dataset.column_names();

    let mut missing_by_column = BTreeMap::new();
    let mut nunique = BTreeMap::new();
    for col in dataset.columns() {
        missing_by_column.insert(col.name().to_string(), col.missing_count());
        nunique.insert(col.name().to_string(), col.nunique());
    }

    let numeric_names = dataset.numeric_column_names();
    let mut describe = BTreeMap::new();
    let mut extreme_value_flags = BTreeMap::new();
    let mut distribution_flags = BTreeMap::new();
    for name in &numeric_names {
        let values = dataset.column(name)?.finite_values();
        if values.is_empty() {
            continue;
        }
        let sorted = sorted_copy(&values);
        describe.insert(
            name.clone(),
            NumericSummary {
                count: values.len(),
                mean: mean(&values),
                std: if values.len() >= 2 {
                    Some(std_dev(&values))
                } else {
                    None
                },
                min: sorted[0],
                q1: quantile_sorted(&sorted, 0.25),
                median: quantile_sorted(&sorted, 0.5),
                q3: quantile_sorted(&sorted, 0.75),
                max: sorted[sorted.len() - 1],
            },
        );

        let outliers = outlier_mask(&values).iter().filter(|&&m| m).count();
        extreme_value_flags.insert(name.clone(), ExtremeValueFlags { count: outliers });

        let skew = skewness(&values);
        let kurt = excess_kurtosis(&values);
        distribution_flags.insert(
            name.clone(),
            DistributionFlags {
                right_skewed: skew.map_or(false, |s| s > SKEW_FLAG_THRESHOLD),
                left_skewed: skew.map_or(false, |s| s < -SKEW_FLAG_THRESHOLD),
                heavy_tails: kurt.map_or(false, |k| k > HEAVY_TAILS_THRESHOLD),
            },
        );
    }

    let corr = correlation_matrix(dataset, &numeric_names)?;

    let (dup_count, dup_indices) = dataset.duplicate_rows();

    Ok(DescribeResult {
        shape: Shape {
            rows: dataset.rows(),
            cols: dataset.cols(),
        },
        columns,
        missing_by_column,
        nunique,
        categorical_columns: dataset.categorical_column_names(),
        describe,
        corr,
        duplicate_rows: DuplicateRows {
            count: dup_count,
            indices: dup_indices,
        },
        extreme_value_flags,
        distribution_flags,
    })
}

/// Pairwise Pearson correlations over pairwise-complete observations.
fn correlation_matrix(
    dataset: &Dataset,
    numeric_names: &[String],
) -> StatResult<BTreeMap<String, BTreeMap<String, Option<f64>>>> {
    let coerced: Vec<Vec<Option<f64>>> = numeric_names
        .iter()
        .map(|name| dataset.column(name).map(|c| c.coerce_numeric()))
        .collect::<StatResult<_>>()?;

    let mut matrix = BTreeMap::new();
    for (i, a_name) in numeric_names.iter().enumerate() {
        let mut row = BTreeMap::new();
        for (j, b_name) in numeric_names.iter().enumerate() {
            let r = if i == j {
                Some(1.0)
            } else {
                let mut xs = Vec::new();
                let mut ys = Vec::new();
                for (a, b) in coerced[i].iter().zip(&coerced[j]) {
                    if let (Some(a), Some(b)) = (a, b) {
                        xs.push(*a);
                        ys.push(*b);
                    }
                }
                pearson_r(&xs, &ys)
            };
            row.insert(b_name.clone(), r);
        }
        matrix.insert(a_name.clone(), row);
    }
    Ok(matrix)
}
