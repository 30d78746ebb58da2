//! Column model: raw cells, numeric view, type inference
//!
//! A column keeps its raw string cells so that categorical analyses see the
//! original labels, and exposes a per-cell numeric coercion for the numeric
//! analyses. The semantic type is inferred once and threaded through every
//! analyzer rather than re-inspected ad hoc.

use serde::Serialize;
use std::collections::HashSet;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Text,
}

/// Numeric columns with at most this many distinct values are treated as
/// categorical (encoded group labels, Likert scales and the like).
pub const CATEGORICAL_CARDINALITY_LIMIT: usize = 10;

/// Non-numeric columns where at least half the values are distinct are
/// treated as free text rather than category labels.
pub const TEXT_UNIQUE_RATIO: f64 = 0.5;

/// A single named column of raw cells
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    cells: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    pub fn cell(&self, row: usize) -> Option<&str> {
        self.cells.get(row).and_then(|c| c.as_deref())
    }

    /// Number of missing (empty) cells
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Number of distinct non-missing values
    pub fn nunique(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .map(|s| s.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Per-cell numeric coercion; cells that do not parse become `None`
    pub fn coerce_numeric(&self) -> Vec<Option<f64>> {
        self.cells
            .iter()
            .map(|c| c.as_deref().and_then(parse_cell))
            .collect()
    }

    /// Non-missing values that coerce to finite numbers, in row order
    pub fn finite_values(&self) -> Vec<f64> {
        self.coerce_numeric().into_iter().flatten().collect()
    }

    /// True when every non-missing cell parses as a finite number
    pub fn is_numeric_dtype(&self) -> bool {
        let mut any = false;
        for cell in self.cells.iter().flatten() {
            if parse_cell(cell).is_none() {
                return false;
            }
            any = true;
        }
        any
    }

    /// Infer the semantic type of this column.
    ///
    /// Numeric columns with few distinct values act as encoded categories;
    /// non-numeric columns split into category labels vs free text by
    /// unique ratio.
    pub fn infer_type(&self) -> ColumnType {
        if self.is_numeric_dtype() {
            if self.nunique() <= CATEGORICAL_CARDINALITY_LIMIT {
                ColumnType::Categorical
            } else {
                ColumnType::Numeric
            }
        } else {
            let non_missing = self.len() - self.missing_count();
            if non_missing > 0
                && self.nunique() as f64 / non_missing as f64 >= TEXT_UNIQUE_RATIO
            {
                ColumnType::Text
            } else {
                ColumnType::Categorical
            }
        }
    }

    /// True when the column should be offered as a grouping/category axis
    pub fn is_categorical(&self) -> bool {
        self.infer_type() != ColumnType::Numeric
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, cells: &[&str]) -> Column {
        Column::new(
            name,
            cells
                .iter()
                .map(|c| {
                    if c.is_empty() {
                        None
                    } else {
                        Some(c.to_string())
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn test_numeric_dtype() {
        let c = col("x", &["1", "2.5", "", "-3"]);
        assert!(c.is_numeric_dtype());
        assert_eq!(c.missing_count(), 1);
        assert_eq!(c.finite_values(), vec![1.0, 2.5, -3.0]);
    }

    #[test]
    fn test_text_dtype() {
        let c = col("name", &["alice", "bob", "42"]);
        assert!(!c.is_numeric_dtype());
    }

    #[test]
    fn test_infer_type_low_cardinality_numeric() {
        let c = col("likert", &["1", "2", "3", "1", "2", "3"]);
        assert_eq!(c.infer_type(), ColumnType::Categorical);
    }

    #[test]
    fn test_infer_type_numeric() {
        let cells: Vec<String> = (0..20).map(|i| format!("{}.5", i)).collect();
        let c = Column::new("score", cells.into_iter().map(Some).collect());
        assert_eq!(c.infer_type(), ColumnType::Numeric);
    }

    #[test]
    fn test_infer_type_categorical_vs_text() {
        let c = col("group", &["a", "b", "a", "b", "a", "b", "a", "b"]);
        assert_eq!(c.infer_type(), ColumnType::Categorical);

        let c = col("id", &["u1", "u2", "u3", "u4"]);
        assert_eq!(c.infer_type(), ColumnType::Text);
    }

    #[test]
    fn test_nunique_ignores_missing() {
        let c = col("g", &["a", "", "b", "a"]);
        assert_eq!(c.nunique(), 2);
    }
}
