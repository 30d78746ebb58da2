//! Intent-driven composite diagnostics
//!
//! One entry point serving three analysis intents (predict, compare_means,
//! association). The shared numeric-outcome pipeline coerces, transforms,
//! flags 3x IQR outliers and optionally excludes them before fitting; each
//! intent then derives its own boolean flags from fixed thresholds, which
//! are echoed back so the client never re-derives them.

use crate::goodness::{levene_brown_forsythe, shapiro_wilk};
use crate::hypothesis::{self, HypothesisResult};
use crate::regression::{breusch_pagan, design_matrix, influence_stats, solve_ols, vif_table};
use nalgebra::DVector;
use serde::Serialize;
use statlab_core::series::{outlier_mask, zscores};
use statlab_core::{ColumnType, Dataset, StatError, StatResult, Transform};
use std::collections::BTreeMap;

/// Fixed decision thresholds, echoed in every response.
pub mod thresholds {
    pub const SHAPIRO_P: f64 = 0.05;
    pub const BREUSCH_PAGAN_P: f64 = 0.05;
    pub const LEVENE_P: f64 = 0.05;
    /// Cook's distance cut-off is 4/n, scaled at runtime.
    pub const COOKS_NUMERATOR: f64 = 4.0;
    pub const VIF: f64 = 10.0;
    pub const OUTCOME_SKEW: f64 = 1.0;
    /// Rows-per-predictor ratio below which the fit is underpowered.
    pub const ROWS_PER_PREDICTOR: f64 = 5.0;
    pub const GROUP_MIN_SIZE: usize = 5;
    pub const GROUP_MAX_COUNT: usize = 20;
    pub const EXPECTED_CELL: f64 = 5.0;
    pub const ZSCORE: f64 = 3.0;
    /// Shapiro-Wilk window for diagnostics (stricter than the regression
    /// endpoint's 5000 cap).
    pub const SHAPIRO_MAX_N: usize = 2000;
    pub const SHAPIRO_MIN_N: usize = 3;
}

/// Analysis intent with the column roles it needs.
#[derive(Debug, Clone)]
pub enum Intent {
    Predict {
        outcome: String,
        predictors: Vec<String>,
    },
    CompareMeans {
        outcome: String,
        group: String,
    },
    Association {
        var_a: String,
        var_b: String,
    },
}

impl Intent {
    /// Build an intent from loosely-typed request fields.
    pub fn parse(
        intent_type: &str,
        outcome: &str,
        predictors: &[String],
        group: &str,
        var_a: &str,
        var_b: &str,
    ) -> StatResult<Self> {
        match intent_type {
            "predict" => {
                if outcome.is_empty() || predictors.is_empty() {
                    return Err(StatError::MissingParameter(
                        "predict requires an outcome and at least one predictor".into(),
                    ));
                }
                Ok(Intent::Predict {
                    outcome: outcome.to_string(),
                    predictors: predictors.to_vec(),
                })
            }
            "compare_means" => {
                if outcome.is_empty() || group.is_empty() {
                    return Err(StatError::MissingParameter(
                        "compare_means requires an outcome and a group column".into(),
                    ));
                }
                Ok(Intent::CompareMeans {
                    outcome: outcome.to_string(),
                    group: group.to_string(),
                })
            }
            "association" => {
                if var_a.is_empty() || var_b.is_empty() {
                    return Err(StatError::MissingParameter(
                        "association requires two variables".into(),
                    ));
                }
                Ok(Intent::Association {
                    var_a: var_a.to_string(),
                    var_b: var_b.to_string(),
                })
            }
            other => Err(StatError::unknown_variant("intent_type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierMode {
    Flag,
    Exclude,
}

impl OutlierMode {
    pub fn parse(s: &str) -> StatResult<Self> {
        match s {
            "" | "flag" => Ok(OutlierMode::Flag),
            "exclude" => Ok(OutlierMode::Exclude),
            other => Err(StatError::unknown_variant("outlier_mode", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSize {
    pub name: String,
    pub n: usize,
}

/// Per-intent diagnostic metrics; fields irrelevant to the intent are
/// omitted from the payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vif_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapiro_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooks_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_sizes: Option<Vec<GroupSize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levene_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chi2_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_expected: Option<bool>,
    pub outlier_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Adjustments {
    pub transform: String,
    pub excluded_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsResult {
    pub diagnostics: DiagnosticsPayload,
    pub flags: BTreeMap<&'static str, bool>,
    pub thresholds: BTreeMap<&'static str, f64>,
    pub adjustments: Adjustments,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_min: Option<f64>,
    pub outlier_count: usize,
    pub warnings: Vec<String>,
}

fn threshold_table() -> BTreeMap<&'static str, f64> {
    BTreeMap::from([
        ("shapiro_p", thresholds::SHAPIRO_P),
        ("breusch_pagan_p", thresholds::BREUSCH_PAGAN_P),
        ("levene_p", thresholds::LEVENE_P),
        ("cooks_numerator", thresholds::COOKS_NUMERATOR),
        ("vif", thresholds::VIF),
        ("outcome_skew", thresholds::OUTCOME_SKEW),
        ("rows_per_predictor", thresholds::ROWS_PER_PREDICTOR),
        ("group_min_size", thresholds::GROUP_MIN_SIZE as f64),
        ("group_max_count", thresholds::GROUP_MAX_COUNT as f64),
        ("expected_cell", thresholds::EXPECTED_CELL),
        ("zscore", thresholds::ZSCORE),
        (
            "iqr_multiplier",
            statlab_core::series::IQR_FENCE_MULTIPLIER,
        ),
    ])
}

/// Shapiro-Wilk with the advisor's stricter sample-size window.
fn shapiro_p_windowed(values: &[f64]) -> Option<f64> {
    if values.len() > thresholds::SHAPIRO_MAX_N {
        return None;
    }
    shapiro_wilk(values).map(|t| t.p_value)
}

/// Run diagnostics for the given intent.
pub fn run(
    dataset: &Dataset,
    intent: &Intent,
    transform: Transform,
    outlier_mode: OutlierMode,
) -> StatResult<DiagnosticsResult> {
    match intent {
        Intent::Predict {
            outcome,
            predictors,
        } => predict(dataset, outcome, predictors, transform, outlier_mode),
        Intent::CompareMeans { outcome, group } => {
            compare_means(dataset, outcome, group, transform, outlier_mode)
        }
        Intent::Association { var_a, var_b } => association(dataset, var_a, var_b),
    }
}

/// Shared numeric-outcome pipeline: transform, flag outliers, optionally
/// exclude them and re-apply the transform to the survivors.
///
/// `keep` reports which input rows survived, so callers can filter
/// columns that travel alongside the outcome.
struct AdjustedOutcome {
    values: Vec<f64>,
    keep: Vec<bool>,
    outcome_min: f64,
    outlier_count: usize,
    excluded_count: usize,
}

fn adjust_outcome(
    raw: &[f64],
    transform: Transform,
    outlier_mode: OutlierMode,
) -> StatResult<AdjustedOutcome> {
    let outcome_min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
    let transformed = transform.apply(raw)?;
    let mask = outlier_mask(&transformed);
    let outlier_count = mask.iter().filter(|&&m| m).count();

    if outlier_mode == OutlierMode::Exclude && outlier_count > 0 {
        let survivors: Vec<f64> = raw
            .iter()
            .zip(&mask)
            .filter(|(_, &flagged)| !flagged)
            .map(|(&v, _)| v)
            .collect();
        let values = transform.apply(&survivors)?;
        Ok(AdjustedOutcome {
            values,
            keep: mask.iter().map(|&m| !m).collect(),
            outcome_min,
            outlier_count,
            excluded_count: outlier_count,
        })
    } else {
        Ok(AdjustedOutcome {
            keep: vec![true; transformed.len()],
            values: transformed,
            outcome_min,
            outlier_count,
            excluded_count: 0,
        })
    }
}

fn predict(
    dataset: &Dataset,
    outcome: &str,
    predictors: &[String],
    transform: Transform,
    outlier_mode: OutlierMode,
) -> StatResult<DiagnosticsResult> {
    let mut selected = vec![outcome.to_string()];
    selected.extend(predictors.iter().cloned());
    let mut aligned = dataset.aligned_numeric(&selected)?;
    let y_raw = aligned.remove(0);
    if y_raw.is_empty() {
        return Err(StatError::InsufficientData(
            "no rows remain after dropping missing values".into(),
        ));
    }

    let adjusted = adjust_outcome(&y_raw, transform, outlier_mode)?;
    let x_values: Vec<Vec<f64>> = aligned
        .into_iter()
        .map(|col| {
            col.into_iter()
                .zip(&adjusted.keep)
                .filter(|(_, &keep)| keep)
                .map(|(v, _)| v)
                .collect()
        })
        .collect();

    let n = adjusted.values.len();
    let p = predictors.len();
    if n <= p + 1 {
        return Err(StatError::InsufficientData(format!(
            "{} usable rows is not enough to fit {} predictors with an intercept",
            n, p
        )));
    }

    let x = design_matrix(&x_values, n);
    let y = DVector::from_vec(adjusted.values.clone());
    let core = solve_ols(&x, &y)?;
    let df_resid = (n - p - 1) as f64;
    let mse = core.sse / df_resid;
    let residuals: Vec<f64> = core.residuals.iter().cloned().collect();

    let shapiro_p = shapiro_p_windowed(&residuals);
    let bp_p = breusch_pagan(&x, &residuals, p).map(|t| t.p_value);
    let influence = influence_stats(&x, &core, mse);
    let cooks_max = influence
        .cooks_distance
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let cooks_cut = thresholds::COOKS_NUMERATOR / n as f64;

    let vif = vif_table(predictors, &x_values, n);
    let vif_max = vif.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    let skew = crate::helpers::skewness(&adjusted.values);

    let mut warnings = Vec::new();
    if shapiro_p.is_none() {
        warnings.push(format!(
            "Shapiro-Wilk skipped: needs {} to {} residuals",
            thresholds::SHAPIRO_MIN_N,
            thresholds::SHAPIRO_MAX_N
        ));
    }

    let flags = BTreeMap::from([
        (
            "normalityPoor",
            shapiro_p.map_or(false, |p| p < thresholds::SHAPIRO_P),
        ),
        (
            "heteroskedastic",
            bp_p.map_or(false, |p| p < thresholds::BREUSCH_PAGAN_P),
        ),
        ("influentialPoints", cooks_max > cooks_cut),
        (
            "multicollinearity",
            p >= 2 && vif_max > thresholds::VIF,
        ),
        (
            "rightSkewed",
            skew.map_or(false, |s| s > thresholds::OUTCOME_SKEW),
        ),
        (
            "npWarning",
            (n as f64) < thresholds::ROWS_PER_PREDICTOR * p as f64,
        ),
        ("outlierFlagged", adjusted.outlier_count > 0),
    ]);

    Ok(DiagnosticsResult {
        diagnostics: DiagnosticsPayload {
            n: Some(n),
            p: Some(p),
            vif_max: Some(vif_max),
            shapiro_p,
            bp_p,
            cooks_max: Some(cooks_max),
            skew,
            outlier_count: adjusted.outlier_count,
            ..Default::default()
        },
        flags,
        thresholds: threshold_table(),
        adjustments: Adjustments {
            transform: transform.as_str().to_string(),
            excluded_count: adjusted.excluded_count,
        },
        outcome_min: Some(adjusted.outcome_min),
        outlier_count: adjusted.outlier_count,
        warnings,
    })
}

fn compare_means(
    dataset: &Dataset,
    outcome: &str,
    group: &str,
    transform: Transform,
    outlier_mode: OutlierMode,
) -> StatResult<DiagnosticsResult> {
    let values = dataset.column(outcome)?.coerce_numeric();
    let labels = dataset.column(group)?;

    let mut y_raw = Vec::new();
    let mut y_labels = Vec::new();
    for row in 0..dataset.rows() {
        if let (Some(v), Some(label)) = (values[row], labels.cell(row)) {
            y_raw.push(v);
            y_labels.push(label.to_string());
        }
    }
    if y_raw.is_empty() {
        return Err(StatError::InsufficientData(
            "no rows remain after dropping missing values".into(),
        ));
    }

    let adjusted = adjust_outcome(&y_raw, transform, outlier_mode)?;
    let kept_labels: Vec<String> = y_labels
        .into_iter()
        .zip(&adjusted.keep)
        .filter(|(_, &keep)| keep)
        .map(|(label, _)| label)
        .collect();

    // Rebuild groups in first-occurrence order
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (label, &value) in kept_labels.iter().zip(adjusted.values.iter()) {
        if !order.contains(label) {
            order.push(label.clone());
        }
        groups.entry(label.clone()).or_default().push(value);
    }
    if order.len() < 2 {
        return Err(StatError::InsufficientData(
            "compare_means requires at least 2 groups".into(),
        ));
    }

    let group_vecs: Vec<Vec<f64>> = order.iter().map(|l| groups[l].clone()).collect();
    let group_sizes: Vec<GroupSize> = order
        .iter()
        .map(|l| GroupSize {
            name: l.clone(),
            n: groups[l].len(),
        })
        .collect();

    let levene_p = levene_brown_forsythe(&group_vecs).map(|t| t.p_value);
    let any_group_non_normal = group_vecs
        .iter()
        .filter_map(|g| shapiro_p_windowed(g))
        .any(|p| p < thresholds::SHAPIRO_P);

    let group_imbalance = order.len() > thresholds::GROUP_MAX_COUNT
        || group_vecs
            .iter()
            .any(|g| g.len() < thresholds::GROUP_MIN_SIZE);

    let flags = BTreeMap::from([
        ("groupImbalance", group_imbalance),
        (
            "heteroskedastic",
            levene_p.map_or(false, |p| p < thresholds::LEVENE_P),
        ),
        ("normalityPoor", any_group_non_normal),
        ("outlierFlagged", adjusted.outlier_count > 0),
    ]);

    Ok(DiagnosticsResult {
        diagnostics: DiagnosticsPayload {
            n: Some(adjusted.values.len()),
            group_sizes: Some(group_sizes),
            levene_p,
            outlier_count: adjusted.outlier_count,
            ..Default::default()
        },
        flags,
        thresholds: threshold_table(),
        adjustments: Adjustments {
            transform: transform.as_str().to_string(),
            excluded_count: adjusted.excluded_count,
        },
        outcome_min: Some(adjusted.outcome_min),
        outlier_count: adjusted.outlier_count,
        warnings: Vec::new(),
    })
}

fn association(dataset: &Dataset, var_a: &str, var_b: &str) -> StatResult<DiagnosticsResult> {
    let type_a = dataset.column_type(var_a)?;
    let type_b = dataset.column_type(var_b)?;
    let numeric_a = type_a == ColumnType::Numeric;
    let numeric_b = type_b == ColumnType::Numeric;

    let mut payload = DiagnosticsPayload::default();
    let mut flags: BTreeMap<&'static str, bool> = BTreeMap::new();

    if !numeric_a && !numeric_b {
        payload.association_type = Some("categorical-categorical".into());
        let result = hypothesis::chi_square(dataset, var_a, var_b)?;
        let HypothesisResult::ChiSquare {
            p_value,
            low_expected_counts,
            ..
        } = result
        else {
            unreachable!();
        };
        payload.chi2_p = Some(p_value);
        payload.low_expected = Some(low_expected_counts);
        flags.insert("lowExpectedCounts", low_expected_counts);
    } else if numeric_a && numeric_b {
        payload.association_type = Some("numeric-numeric".into());
        let aligned = dataset.aligned_numeric(&[var_a.to_string(), var_b.to_string()])?;
        let (a, b) = (&aligned[0], &aligned[1]);
        if a.len() < 3 {
            return Err(StatError::InsufficientData(
                "association needs at least 3 complete rows".into(),
            ));
        }
        payload.n = Some(a.len());
        payload.correlation = crate::helpers::pearson_r(a, b);

        let za = zscores(a);
        let zb = zscores(b);
        let outlier_count = za
            .iter()
            .zip(&zb)
            .filter(|(za, zb)| za.abs() > thresholds::ZSCORE || zb.abs() > thresholds::ZSCORE)
            .count();
        payload.outlier_count = outlier_count;
        flags.insert("outlierFlagged", outlier_count > 0);
    } else {
        let (numeric_col, group_col, label) = if numeric_a {
            (var_a, var_b, "numeric-categorical")
        } else {
            (var_b, var_a, "categorical-numeric")
        };
        payload.association_type = Some(label.into());

        let groups = dataset.grouped_numeric(numeric_col, group_col)?;
        if groups.len() < 2 {
            return Err(StatError::InsufficientData(
                "association needs at least 2 groups".into(),
            ));
        }
        let all: Vec<f64> = groups.iter().flat_map(|(_, g)| g.iter().cloned()).collect();
        let outlier_count = outlier_mask(&all).iter().filter(|&&m| m).count();
        let group_imbalance = groups.len() > thresholds::GROUP_MAX_COUNT
            || groups.iter().any(|(_, g)| g.len() < thresholds::GROUP_MIN_SIZE);

        payload.n = Some(all.len());
        payload.group_sizes = Some(
            groups
                .iter()
                .map(|(name, g)| GroupSize {
                    name: name.clone(),
                    n: g.len(),
                })
                .collect(),
        );
        payload.outlier_count = outlier_count;
        flags.insert("groupImbalance", group_imbalance);
        flags.insert("outlierFlagged", outlier_count > 0);
    }

    let outlier_count = payload.outlier_count;
    Ok(DiagnosticsResult {
        diagnostics: payload,
        flags,
        thresholds: threshold_table(),
        adjustments: Adjustments {
            transform: Transform::None.as_str().to_string(),
            excluded_count: 0,
        },
        outcome_min: None,
        outlier_count,
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statlab_core::Dataset;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_csv(csv.as_bytes()).unwrap()
    }

    fn predict_intent(outcome: &str, predictors: &[&str]) -> Intent {
        Intent::Predict {
            outcome: outcome.to_string(),
            predictors: predictors.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn linear_csv(n: usize) -> String {
        let mut csv = String::from("x,y\n");
        for i in 0..n {
            let x = i as f64;
            // Gentle nonlinear wiggle keeps residuals non-degenerate
            let y = 2.0 * x + 1.0 + (x * 0.7).sin();
            csv.push_str(&format!("{},{}\n", x, y));
        }
        csv
    }

    #[test]
    fn test_predict_clean_data_no_flags() {
        let ds = dataset(&linear_csv(40));
        let result = run(
            &ds,
            &predict_intent("y", &["x"]),
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();

        assert!(!result.flags["npWarning"]);
        assert!(!result.flags["multicollinearity"]);
        assert_eq!(result.diagnostics.n, Some(40));
        assert_eq!(result.diagnostics.p, Some(1));
        assert_eq!(result.adjustments.excluded_count, 0);
        assert!(result.thresholds["vif"] == 10.0);
    }

    #[test]
    fn test_predict_np_warning_on_tiny_sample() {
        let ds = dataset("x,z,y\n1,3,2\n2,1,4\n3,4,7\n4,2,8\n5,6,11\n6,5,12\n");
        let result = run(
            &ds,
            &predict_intent("y", &["x", "z"]),
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();
        assert!(result.flags["npWarning"]);
    }

    #[test]
    fn test_predict_outlier_exclusion_shrinks_n() {
        let mut csv = linear_csv(30);
        csv.push_str("30,10000\n");
        let ds = dataset(&csv);

        let flagged = run(
            &ds,
            &predict_intent("y", &["x"]),
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();
        assert_eq!(flagged.outlier_count, 1);
        assert_eq!(flagged.diagnostics.n, Some(31));

        let excluded = run(
            &ds,
            &predict_intent("y", &["x"]),
            Transform::None,
            OutlierMode::Exclude,
        )
        .unwrap();
        assert_eq!(excluded.adjustments.excluded_count, 1);
        assert_eq!(excluded.diagnostics.n, Some(30));
    }

    #[test]
    fn test_predict_transform_domain_error() {
        let ds = dataset("x,y\n1,0\n2,2\n3,4\n4,6\n5,8\n");
        let err = run(
            &ds,
            &predict_intent("y", &["x"]),
            Transform::Log,
            OutlierMode::Flag,
        )
        .unwrap_err();
        assert!(matches!(err, StatError::InvalidTransform(_)));
    }

    #[test]
    fn test_compare_means_group_imbalance() {
        let ds = dataset("score,grp\n1,a\n2,a\n3,a\n4,a\n5,a\n6,a\n7,b\n8,b\n");
        let result = run(
            &ds,
            &Intent::CompareMeans {
                outcome: "score".into(),
                group: "grp".into(),
            },
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();

        // Group b has fewer than 5 rows
        assert!(result.flags["groupImbalance"]);
        let sizes = result.diagnostics.group_sizes.unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0].name, "a");
        assert_eq!(sizes[0].n, 6);
    }

    #[test]
    fn test_association_numeric_numeric() {
        let mut csv = String::from("a,b\n");
        for i in 0..25 {
            csv.push_str(&format!("{},{}\n", i, i * 2 + 1));
        }
        let ds = dataset(&csv);
        let result = run(
            &ds,
            &Intent::Association {
                var_a: "a".into(),
                var_b: "b".into(),
            },
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();

        assert_eq!(
            result.diagnostics.association_type.as_deref(),
            Some("numeric-numeric")
        );
        assert!((result.diagnostics.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_association_categorical_categorical() {
        let mut csv = String::from("a,b\n");
        for _ in 0..3 {
            csv.push_str("x,u\nx,v\ny,u\ny,v\n");
        }
        let ds = dataset(&csv);
        let result = run(
            &ds,
            &Intent::Association {
                var_a: "a".into(),
                var_b: "b".into(),
            },
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();

        assert_eq!(
            result.diagnostics.association_type.as_deref(),
            Some("categorical-categorical")
        );
        assert_eq!(result.flags.get("lowExpectedCounts"), Some(&true));
    }

    #[test]
    fn test_association_mixed() {
        // 12 distinct score values keep the column numeric under the
        // low-cardinality rule
        let ds = dataset(
            "score,grp\n1.5,a\n2.5,a\n3.5,a\n4.5,a\n5.5,a\n6.5,a\n7.5,b\n8.5,b\n9.5,b\n10.5,b\n11.5,b\n12.5,b\n",
        );
        let result = run(
            &ds,
            &Intent::Association {
                var_a: "score".into(),
                var_b: "grp".into(),
            },
            Transform::None,
            OutlierMode::Flag,
        )
        .unwrap();

        assert_eq!(
            result.diagnostics.association_type.as_deref(),
            Some("numeric-categorical")
        );
        assert_eq!(result.flags.get("groupImbalance"), Some(&false));
    }

    #[test]
    fn test_intent_parse_errors() {
        assert!(matches!(
            Intent::parse("predict", "", &[], "", "", ""),
            Err(StatError::MissingParameter(_))
        ));
        assert!(matches!(
            Intent::parse("explore", "y", &[], "", "", ""),
            Err(StatError::UnknownVariant { .. })
        ));
    }
}
