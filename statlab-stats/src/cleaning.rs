//! Dataset cleaning operations
//!
//! Row/column filtering and imputation over a parsed dataset, returning
//! the cleaned dataset together with a human-readable operation log and
//! the before/after shape. Not part of the analytic core; its output is a
//! valid input to every analyzer.

use serde::Deserialize;
use statlab_core::series::{mean, outlier_fences, quantile, zscores};
use statlab_core::{Column, Dataset, StatResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanOptions {
    pub drop_na: bool,
    pub fill_mean: bool,
    pub fill_median: bool,
    pub drop_high_missing: bool,
    /// Percent threshold for `drop_high_missing`.
    pub missing_threshold: f64,
    pub remove_outliers_iqr: bool,
    pub remove_outliers_zscore: bool,
    pub drop_duplicates: bool,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub dataset: Dataset,
    pub operations: Vec<String>,
    pub original_shape: (usize, usize),
    pub new_shape: (usize, usize),
}

struct Working {
    names: Vec<String>,
    cells: Vec<Vec<Option<String>>>,
}

impl Working {
    fn rows(&self) -> usize {
        self.cells.first().map(|c| c.len()).unwrap_or(0)
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        for col in &mut self.cells {
            let mut row = 0;
            col.retain(|_| {
                let kept = keep.get(row).copied().unwrap_or(true);
                row += 1;
                kept
            });
        }
    }

    fn numeric_view(&self, col: usize) -> Vec<Option<f64>> {
        self.cells[col]
            .iter()
            .map(|c| c.as_deref().and_then(|s| s.trim().parse::<f64>().ok()))
            .collect()
    }

    fn is_numeric(&self, col: usize) -> bool {
        let mut any = false;
        for cell in self.cells[col].iter().flatten() {
            if cell.trim().parse::<f64>().is_err() {
                return false;
            }
            any = true;
        }
        any
    }
}

/// Apply the requested cleaning operations in a fixed order: column
/// drops, then missing-value handling, then duplicate removal, then
/// outlier removal.
pub fn clean(dataset: &Dataset, options: &CleanOptions) -> StatResult<CleanOutcome> {
    let original_shape = (dataset.rows(), dataset.cols());
    let mut working = Working {
        names: dataset.column_names(),
        cells: dataset
            .columns()
            .iter()
            .map(|c| c.cells().to_vec())
            .collect(),
    };
    let mut operations = Vec::new();

    if options.drop_high_missing {
        drop_high_missing_columns(&mut working, options.missing_threshold, &mut operations);
    }
    if options.drop_na {
        drop_missing_rows(&mut working, &mut operations);
    }
    if options.fill_mean {
        fill_numeric(&mut working, FillWith::Mean, &mut operations);
    }
    if options.fill_median {
        fill_numeric(&mut working, FillWith::Median, &mut operations);
    }
    if options.drop_duplicates {
        drop_duplicate_rows(&mut working, &mut operations);
    }
    if options.remove_outliers_iqr {
        remove_outliers_iqr(&mut working, &mut operations);
    }
    if options.remove_outliers_zscore {
        remove_outliers_zscore(&mut working, &mut operations);
    }

    let columns: Vec<Column> = working
        .names
        .iter()
        .zip(working.cells)
        .map(|(name, cells)| Column::new(name.clone(), cells))
        .collect();
    let dataset = Dataset::from_columns(columns)?;
    let new_shape = (dataset.rows(), dataset.cols());

    Ok(CleanOutcome {
        dataset,
        operations,
        original_shape,
        new_shape,
    })
}

fn drop_high_missing_columns(working: &mut Working, threshold_pct: f64, log: &mut Vec<String>) {
    let rows = working.rows();
    if rows == 0 {
        return;
    }
    let mut dropped = Vec::new();
    let mut i = 0;
    while i < working.names.len() {
        let missing = working.cells[i].iter().filter(|c| c.is_none()).count();
        let pct = 100.0 * missing as f64 / rows as f64;
        if pct > threshold_pct {
            dropped.push(working.names.remove(i));
            working.cells.remove(i);
        } else {
            i += 1;
        }
    }
    if !dropped.is_empty() {
        log.push(format!(
            "Dropped {} column(s) above {}% missing: {}",
            dropped.len(),
            threshold_pct,
            dropped.join(", ")
        ));
    }
}

fn drop_missing_rows(working: &mut Working, log: &mut Vec<String>) {
    let rows = working.rows();
    let keep: Vec<bool> = (0..rows)
        .map(|r| working.cells.iter().all(|col| col[r].is_some()))
        .collect();
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        working.retain_rows(&keep);
        log.push(format!("Dropped {} row(s) with missing values", removed));
    }
}

enum FillWith {
    Mean,
    Median,
}

fn fill_numeric(working: &mut Working, with: FillWith, log: &mut Vec<String>) {
    let mut filled_cells = 0;
    let mut filled_cols = 0;
    for i in 0..working.names.len() {
        if !working.is_numeric(i) {
            continue;
        }
        let values: Vec<f64> = working.numeric_view(i).into_iter().flatten().collect();
        if values.is_empty() {
            continue;
        }
        let fill = match with {
            FillWith::Mean => mean(&values),
            FillWith::Median => quantile(&values, 0.5),
        };
        let mut filled_here = 0;
        for cell in working.cells[i].iter_mut() {
            if cell.is_none() {
                *cell = Some(format!("{}", fill));
                filled_here += 1;
            }
        }
        if filled_here > 0 {
            filled_cells += filled_here;
            filled_cols += 1;
        }
    }
    if filled_cells > 0 {
        let label = match with {
            FillWith::Mean => "mean",
            FillWith::Median => "median",
        };
        log.push(format!(
            "Imputed {} with the column {} in {} column(s)",
            filled_cells, label, filled_cols
        ));
    }
}

fn drop_duplicate_rows(working: &mut Working, log: &mut Vec<String>) {
    let rows = working.rows();
    let mut seen = std::collections::HashSet::new();
    let keep: Vec<bool> = (0..rows)
        .map(|r| {
            let key: Vec<Option<&str>> = working
                .cells
                .iter()
                .map(|col| col[r].as_deref())
                .collect();
            seen.insert(key.iter().map(|c| c.unwrap_or("")).collect::<Vec<_>>().join("\u{1f}"))
        })
        .collect();
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        working.retain_rows(&keep);
        log.push(format!("Removed {} duplicate row(s)", removed));
    }
}

fn remove_outliers_iqr(working: &mut Working, log: &mut Vec<String>) {
    let rows = working.rows();
    let mut keep = vec![true; rows];
    for i in 0..working.names.len() {
        if !working.is_numeric(i) {
            continue;
        }
        let view = working.numeric_view(i);
        let values: Vec<f64> = view.iter().flatten().cloned().collect();
        let Some((lo, hi)) = outlier_fences(&values) else {
            continue;
        };
        for (r, v) in view.iter().enumerate() {
            if let Some(v) = v {
                if *v < lo || *v > hi {
                    keep[r] = false;
                }
            }
        }
    }
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        working.retain_rows(&keep);
        log.push(format!("Removed {} outlier row(s) by the 3xIQR rule", removed));
    }
}

fn remove_outliers_zscore(working: &mut Working, log: &mut Vec<String>) {
    let rows = working.rows();
    let mut keep = vec![true; rows];
    for i in 0..working.names.len() {
        if !working.is_numeric(i) {
            continue;
        }
        let view = working.numeric_view(i);
        let values: Vec<f64> = view.iter().flatten().cloned().collect();
        let z = zscores(&values);
        let mut zi = z.iter();
        for (r, v) in view.iter().enumerate() {
            if v.is_some() {
                if zi.next().map_or(false, |z| z.abs() >= 3.0) {
                    keep[r] = false;
                }
            }
        }
    }
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        working.retain_rows(&keep);
        log.push(format!("Removed {} outlier row(s) with |z| >= 3", removed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_drop_na() {
        let ds = dataset("x,y\n1,2\n2,\n3,6\n");
        let outcome = clean(
            &ds,
            &CleanOptions {
                drop_na: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.new_shape, (2, 2));
        assert_eq!(outcome.original_shape, (3, 2));
        assert_eq!(outcome.operations.len(), 1);
    }

    #[test]
    fn test_fill_mean() {
        let ds = dataset("x\n1\n\n3\n");
        let outcome = clean(
            &ds,
            &CleanOptions {
                fill_mean: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.new_shape, (3, 1));
        let filled = outcome.dataset.column("x").unwrap().finite_values();
        assert_eq!(filled, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_drop_high_missing_column() {
        let ds = dataset("x,mostly_empty\n1,\n2,\n3,9\n4,\n");
        let outcome = clean(
            &ds,
            &CleanOptions {
                drop_high_missing: true,
                missing_threshold: 50.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.new_shape, (4, 1));
        assert_eq!(outcome.dataset.column_names(), vec!["x"]);
    }

    #[test]
    fn test_drop_duplicates() {
        let ds = dataset("x,y\n1,a\n1,a\n2,b\n");
        let outcome = clean(
            &ds,
            &CleanOptions {
                drop_duplicates: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.new_shape, (2, 2));
    }

    #[test]
    fn test_remove_outliers_iqr() {
        let mut csv = String::from("x\n");
        for i in 1..=20 {
            csv.push_str(&format!("{}\n", i));
        }
        csv.push_str("5000\n");
        let ds = dataset(&csv);
        let outcome = clean(
            &ds,
            &CleanOptions {
                remove_outliers_iqr: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.new_shape.0, 20);
    }

    #[test]
    fn test_no_ops_is_identity() {
        let ds = dataset("x,y\n1,2\n3,\n");
        let outcome = clean(&ds, &CleanOptions::default()).unwrap();
        assert_eq!(outcome.new_shape, outcome.original_shape);
        assert!(outcome.operations.is_empty());
    }

    #[test]
    fn test_cleaned_dataset_feeds_analyzers() {
        let ds = dataset("x,y\n1,2\n2,4\n3,\n4,8\n5,10\n6,12\n");
        let outcome = clean(
            &ds,
            &CleanOptions {
                drop_na: true,
                ..Default::default()
            },
        )
        .unwrap();
        let fit = crate::regression::fit(&outcome.dataset, &["x".to_string()], "y").unwrap();
        assert_eq!(fit.n, 5);
        assert!((fit.coefficients["x"] - 2.0).abs() < 1e-9);
    }
}
