//! Hypothesis tests: two-sample t, paired t, chi-square independence,
//! one-way ANOVA
//!
//! Each variant validates its inputs before computing and reports effect
//! sizes alongside the test statistic. Degenerate effect sizes (zero
//! pooled variance, zero total sum of squares) come back as null rather
//! than failing the request.

use crate::distributions::{chi_cdf, f_cdf, t_cdf, t_inv};
use crate::helpers::{cohens_d_pooled, mean_ci, Interval};
use serde::Serialize;
use statlab_core::series::{mean, std_dev, variance};
use statlab_core::{Dataset, StatError, StatResult};
use std::collections::BTreeMap;

pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Expected contingency cells below this count make the chi-square
/// approximation unreliable.
pub const LOW_EXPECTED_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub n: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub ci_mean: Option<Interval>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectSize {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohens_d: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_squared: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cramers_v: Option<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "test")]
pub enum HypothesisResult {
    #[serde(rename = "two_sample_t")]
    TwoSampleT {
        stat: f64,
        p_value: f64,
        dof: f64,
        n: usize,
        group_labels: Vec<String>,
        group_stats: BTreeMap<String, GroupStats>,
        effect_size: EffectSize,
        ci_mean_diff: Interval,
    },
    #[serde(rename = "paired_t")]
    PairedT {
        stat: f64,
        p_value: f64,
        dof: f64,
        n: usize,
        group_labels: Vec<String>,
        group_stats: BTreeMap<String, GroupStats>,
        effect_size: EffectSize,
        ci_mean_diff: Interval,
    },
    #[serde(rename = "chi_square")]
    ChiSquare {
        chi2: f64,
        p_value: f64,
        dof: usize,
        n: usize,
        effect_size: EffectSize,
        low_expected_counts: bool,
    },
    #[serde(rename = "anova")]
    Anova {
        stat: f64,
        p_value: f64,
        dof_between: usize,
        dof_within: usize,
        n: usize,
        group_labels: Vec<String>,
        group_stats: BTreeMap<String, GroupStats>,
        effect_size: EffectSize,
    },
}

/// Dispatch on `test_type` and run the matching test.
pub fn run(
    dataset: &Dataset,
    test_type: &str,
    column_a: &str,
    column_b: &str,
    group_col: &str,
) -> StatResult<HypothesisResult> {
    match test_type {
        "two_sample_t" => two_sample_t(dataset, column_a, group_col),
        "paired_t" => paired_t(dataset, column_a, column_b),
        "chi_square" => chi_square(dataset, column_a, column_b),
        "anova" => anova(dataset, column_a, group_col),
        other => Err(StatError::unknown_variant("test_type", other)),
    }
}

fn group_summary(values: &[f64]) -> GroupStats {
    GroupStats {
        n: values.len(),
        mean: mean(values),
        std: if values.len() >= 2 {
            Some(std_dev(values))
        } else {
            None
        },
        ci_mean: mean_ci(values, CONFIDENCE_LEVEL),
    }
}

/// Welch's unequal-variance two-sample t-test on a numeric column split by
/// a two-level group column.
pub fn two_sample_t(
    dataset: &Dataset,
    value_col: &str,
    group_col: &str,
) -> StatResult<HypothesisResult> {
    if value_col.is_empty() || group_col.is_empty() {
        return Err(StatError::MissingParameter(
            "two_sample_t requires a numeric column and a group column".into(),
        ));
    }

    let groups = dataset.grouped_numeric(value_col, group_col)?;
    if groups.len() != 2 {
        return Err(StatError::InsufficientData(format!(
            "group column '{}' must have exactly 2 distinct values, found {}",
            group_col,
            groups.len()
        )));
    }

    let (label_a, a) = &groups[0];
    let (label_b, b) = &groups[1];
    if a.len() < 2 || b.len() < 2 {
        return Err(StatError::InsufficientData(
            "two_sample_t requires at least 2 observations in each group".into(),
        ));
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (v1, v2) = (variance(a), variance(b));
    let se_squared = v1 / n1 + v2 / n2;
    let se = se_squared.sqrt();
    if se == 0.0 {
        return Err(StatError::ComputationFailure(
            "both groups have zero variance".into(),
        ));
    }

    let mean_diff = mean(a) - mean(b);
    let stat = mean_diff / se;

    // Welch-Satterthwaite degrees of freedom
    let dof = se_squared * se_squared
        / ((v1 / n1).powi(2) / (n1 - 1.0) + (v2 / n2).powi(2) / (n2 - 1.0));
    let p_value = 2.0 * (1.0 - t_cdf(stat.abs(), dof));

    let t_crit = t_inv(0.5 + CONFIDENCE_LEVEL / 2.0, dof);
    let ci_mean_diff = Interval {
        low: mean_diff - t_crit * se,
        high: mean_diff + t_crit * se,
    };

    let mut group_stats = BTreeMap::new();
    group_stats.insert(label_a.clone(), group_summary(a));
    group_stats.insert(label_b.clone(), group_summary(b));

    Ok(HypothesisResult::TwoSampleT {
        stat,
        p_value: p_value.clamp(0.0, 1.0),
        dof,
        n: a.len() + b.len(),
        group_labels: vec![label_a.clone(), label_b.clone()],
        group_stats,
        effect_size: EffectSize {
            cohens_d: Some(cohens_d_pooled(a, b)),
            eta_squared: None,
            cramers_v: None,
        },
        ci_mean_diff,
    })
}

/// Paired t-test on the row-wise differences of two numeric columns.
pub fn paired_t(
    dataset: &Dataset,
    column_a: &str,
    column_b: &str,
) -> StatResult<HypothesisResult> {
    if column_a.is_empty() || column_b.is_empty() {
        return Err(StatError::MissingParameter(
            "paired_t requires two numeric columns".into(),
        ));
    }

    let aligned = dataset.aligned_numeric(&[column_a.to_string(), column_b.to_string()])?;
    let (a, b) = (&aligned[0], &aligned[1]);
    if a.len() < 2 {
        return Err(StatError::InsufficientData(
            "paired_t requires at least 2 paired observations".into(),
        ));
    }

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len();
    let dof = (n - 1) as f64;
    let sd_diff = std_dev(&diffs);
    if sd_diff == 0.0 {
        return Err(StatError::ComputationFailure(
            "differences have zero standard deviation".into(),
        ));
    }

    let mean_diff = mean(&diffs);
    let se = sd_diff / (n as f64).sqrt();
    let stat = mean_diff / se;
    let p_value = 2.0 * (1.0 - t_cdf(stat.abs(), dof));

    let t_crit = t_inv(0.5 + CONFIDENCE_LEVEL / 2.0, dof);
    let ci_mean_diff = Interval {
        low: mean_diff - t_crit * se,
        high: mean_diff + t_crit * se,
    };

    let cohens_d = Some(mean_diff / sd_diff);

    let mut group_stats = BTreeMap::new();
    group_stats.insert(column_a.to_string(), group_summary(a));
    group_stats.insert(column_b.to_string(), group_summary(b));

    Ok(HypothesisResult::PairedT {
        stat,
        p_value: p_value.clamp(0.0, 1.0),
        dof,
        n,
        group_labels: vec![column_a.to_string(), column_b.to_string()],
        group_stats,
        effect_size: EffectSize {
            cohens_d: Some(cohens_d),
            eta_squared: None,
            cramers_v: None,
        },
        ci_mean_diff,
    })
}

/// Pearson chi-square test of independence between two categorical
/// columns.
pub fn chi_square(
    dataset: &Dataset,
    column_a: &str,
    column_b: &str,
) -> StatResult<HypothesisResult> {
    if column_a.is_empty() || column_b.is_empty() {
        return Err(StatError::MissingParameter(
            "chi_square requires two categorical columns".into(),
        ));
    }

    let col_a = dataset.column(column_a)?;
    let col_b = dataset.column(column_b)?;

    // Contingency table over rows present in both columns
    let mut row_labels: Vec<String> = Vec::new();
    let mut col_labels: Vec<String> = Vec::new();
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in 0..dataset.rows() {
        let (Some(a), Some(b)) = (col_a.cell(row), col_b.cell(row)) else {
            continue;
        };
        if !row_labels.iter().any(|l| l == a) {
            row_labels.push(a.to_string());
        }
        if !col_labels.iter().any(|l| l == b) {
            col_labels.push(b.to_string());
        }
        *counts.entry((a.to_string(), b.to_string())).or_insert(0) += 1;
    }

    let (r, c) = (row_labels.len(), col_labels.len());
    if r < 2 || c < 2 {
        return Err(StatError::InsufficientData(format!(
            "chi_square needs at least 2 categories in each column, found {}x{}",
            r, c
        )));
    }

    let observed: Vec<Vec<f64>> = row_labels
        .iter()
        .map(|ra| {
            col_labels
                .iter()
                .map(|cb| *counts.get(&(ra.clone(), cb.clone())).unwrap_or(&0) as f64)
                .collect()
        })
        .collect();

    let row_totals: Vec<f64> = observed.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..c)
        .map(|j| observed.iter().map(|row| row[j]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();

    let mut chi2 = 0.0;
    let mut low_expected_counts = false;
    for i in 0..r {
        for j in 0..c {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected < LOW_EXPECTED_THRESHOLD {
                low_expected_counts = true;
            }
            if expected > 0.0 {
                chi2 += (observed[i][j] - expected).powi(2) / expected;
            }
        }
    }

    let dof = (r - 1) * (c - 1);
    let p_value = (1.0 - chi_cdf(chi2, dof as f64)).clamp(0.0, 1.0);

    let denom = total * (r - 1).min(c - 1) as f64;
    let cramers_v = if denom > 0.0 {
        Some((chi2 / denom).sqrt())
    } else {
        None
    };

    Ok(HypothesisResult::ChiSquare {
        chi2,
        p_value,
        dof,
        n: total as usize,
        effect_size: EffectSize {
            cohens_d: None,
            eta_squared: None,
            cramers_v: Some(cramers_v),
        },
        low_expected_counts,
    })
}

/// One-way ANOVA of a numeric column across the levels of a group column.
pub fn anova(dataset: &Dataset, value_col: &str, group_col: &str) -> StatResult<HypothesisResult> {
    if value_col.is_empty() || group_col.is_empty() {
        return Err(StatError::MissingParameter(
            "anova requires a numeric column and a group column".into(),
        ));
    }

    let groups = dataset.grouped_numeric(value_col, group_col)?;
    if groups.len() < 2 {
        return Err(StatError::InsufficientData(
            "anova requires at least 2 groups".into(),
        ));
    }

    let total_n: usize = groups.iter().map(|(_, g)| g.len()).sum();
    let k = groups.len();
    if total_n <= k {
        return Err(StatError::InsufficientData(
            "anova requires more observations than groups".into(),
        ));
    }

    let all: Vec<f64> = groups.iter().flat_map(|(_, g)| g.iter().cloned()).collect();
    let grand_mean = mean(&all);

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for (_, g) in &groups {
        let gm = mean(g);
        ss_between += g.len() as f64 * (gm - grand_mean).powi(2);
        ss_within += g.iter().map(|v| (v - gm).powi(2)).sum::<f64>();
    }

    let dof_between = k - 1;
    let dof_within = total_n - k;
    let ms_between = ss_between / dof_between as f64;
    let ms_within = ss_within / dof_within as f64;
    if ms_within == 0.0 {
        return Err(StatError::ComputationFailure(
            "zero within-group variance".into(),
        ));
    }

    let stat = ms_between / ms_within;
    let p_value = (1.0 - f_cdf(stat, dof_between as f64, dof_within as f64)).clamp(0.0, 1.0);

    let ss_total = ss_between + ss_within;
    let eta_squared = if ss_total > 0.0 {
        Some(ss_between / ss_total)
    } else {
        None
    };

    let mut group_labels = Vec::with_capacity(k);
    let mut group_stats = BTreeMap::new();
    for (label, g) in &groups {
        group_labels.push(label.clone());
        group_stats.insert(label.clone(), group_summary(g));
    }

    Ok(HypothesisResult::Anova {
        stat,
        p_value,
        dof_between,
        dof_within,
        n: total_n,
        group_labels,
        group_stats,
        effect_size: EffectSize {
            cohens_d: None,
            eta_squared: Some(eta_squared),
            cramers_v: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statlab_core::Dataset;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_two_sample_t_direction_and_significance() {
        let ds = dataset("score,group\n1,a\n2,a\n3,a\n4,b\n5,b\n6,b\n");
        let result = run(&ds, "two_sample_t", "score", "", "group").unwrap();

        let HypothesisResult::TwoSampleT {
            stat,
            p_value,
            effect_size,
            ..
        } = result
        else {
            panic!("wrong variant");
        };
        assert!(stat < 0.0);
        assert!(p_value < 0.05);
        let d = effect_size.cohens_d.unwrap().unwrap();
        assert!(d < -1.0);
    }

    #[test]
    fn test_two_sample_t_requires_two_groups() {
        let ds = dataset("score,group\n1,a\n2,a\n3,b\n4,b\n5,c\n6,c\n");
        let err = run(&ds, "two_sample_t", "score", "", "group").unwrap_err();
        assert!(matches!(err, StatError::InsufficientData(_)));
    }

    #[test]
    fn test_paired_t_positive_shift() {
        let ds = dataset("before,after\n10,12\n11,13\n9,12\n10,11\n12,15\n");
        let result = run(&ds, "paired_t", "before", "after", "").unwrap();

        let HypothesisResult::PairedT {
            stat,
            p_value,
            ci_mean_diff,
            ..
        } = result
        else {
            panic!("wrong variant");
        };
        // before - after is negative
        assert!(stat < 0.0);
        assert!(p_value < 0.05);
        assert!(ci_mean_diff.high < 0.0);
    }

    #[test]
    fn test_chi_square_low_expected() {
        let ds = dataset("a,b\nx,u\nx,v\ny,u\ny,v\nx,u\ny,v\n");
        let result = run(&ds, "chi_square", "a", "b", "").unwrap();

        let HypothesisResult::ChiSquare {
            effect_size,
            low_expected_counts,
            dof,
            ..
        } = result
        else {
            panic!("wrong variant");
        };
        assert_eq!(dof, 1);
        assert!(low_expected_counts);
        assert!(effect_size.cramers_v.unwrap().is_some());
    }

    #[test]
    fn test_chi_square_independent_is_insignificant() {
        let mut csv = String::from("a,b\n");
        // Balanced 2x2 table: no association
        for _ in 0..10 {
            csv.push_str("x,u\nx,v\ny,u\ny,v\n");
        }
        let ds = dataset(&csv);
        let result = run(&ds, "chi_square", "a", "b", "").unwrap();
        let HypothesisResult::ChiSquare { chi2, p_value, .. } = result else {
            panic!("wrong variant");
        };
        assert!(chi2.abs() < 1e-9);
        assert!(p_value > 0.9);
    }

    #[test]
    fn test_anova_separated_groups() {
        let ds = dataset(
            "score,group\n1,a\n2,a\n3,a\n11,b\n12,b\n13,b\n21,c\n22,c\n23,c\n",
        );
        let result = run(&ds, "anova", "score", "", "group").unwrap();

        let HypothesisResult::Anova {
            stat,
            p_value,
            effect_size,
            group_labels,
            ..
        } = result
        else {
            panic!("wrong variant");
        };
        assert!(stat > 10.0);
        assert!(p_value < 0.01);
        assert_eq!(group_labels, vec!["a", "b", "c"]);
        let eta = effect_size.eta_squared.unwrap().unwrap();
        assert!(eta > 0.9);
    }

    #[test]
    fn test_unknown_test_type() {
        let ds = dataset("x,y\n1,2\n");
        let err = run(&ds, "median_test", "x", "y", "").unwrap_err();
        assert!(matches!(err, StatError::UnknownVariant { .. }));
    }
}
