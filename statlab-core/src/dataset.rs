//! Dataset: an ordered collection of equally-long named columns
//!
//! Request-scoped. Each request parses its upload into a `Dataset`, runs one
//! analysis over it, and drops it; nothing is cached across calls.

use crate::column::{Column, ColumnType};
use crate::error::{StatError, StatResult};
use std::collections::HashMap;

/// Cap on how many duplicate row indices are reported back to the client.
pub const DUPLICATE_INDEX_LIMIT: usize = 100;

/// A parsed tabular dataset. Column types are inferred once at
/// construction and threaded through the analyzers.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    types: Vec<ColumnType>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from columns, enforcing the uniform row count
    /// invariant.
    pub fn from_columns(columns: Vec<Column>) -> StatResult<Self> {
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for col in &columns {
            if col.len() != rows {
                return Err(StatError::ParseError(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name(),
                    col.len(),
                    rows
                )));
            }
        }
        let types = columns.iter().map(|c| c.infer_type()).collect();
        Ok(Self {
            columns,
            types,
            rows,
        })
    }

    /// Parse a CSV upload (first record is the header).
    pub fn from_csv(bytes: &[u8]) -> StatResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| StatError::ParseError(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() {
            return Err(StatError::ParseError("no header row".into()));
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|e| StatError::ParseError(e.to_string()))?;
            for (i, column) in cells.iter_mut().enumerate() {
                let value = record.get(i).unwrap_or("");
                column.push(if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                });
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::new(name, cells))
            .collect();
        Self::from_columns(columns)
    }

    /// Serialize back to CSV (used by the cleaning endpoint).
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let names: Vec<&str> = self.columns.iter().map(|c| c.name()).collect();
        out.push_str(&join_csv_row(&names));
        out.push('\n');
        for row in 0..self.rows {
            let cells: Vec<&str> = self
                .columns
                .iter()
                .map(|c| c.cell(row).unwrap_or(""))
                .collect();
            out.push_str(&join_csv_row(&cells));
            out.push('\n');
        }
        out
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Look up a column by name; unknown names are a request-level error.
    pub fn column(&self, name: &str) -> StatResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| StatError::ColumnNotFound(name.to_string()))
    }

    /// Semantic type inferred for a column at construction.
    pub fn column_type(&self, name: &str) -> StatResult<ColumnType> {
        self.columns
            .iter()
            .position(|c| c.name() == name)
            .map(|i| self.types[i])
            .ok_or_else(|| StatError::ColumnNotFound(name.to_string()))
    }

    /// Names of columns whose every non-missing cell parses as a number
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric_dtype())
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Names of columns offered as grouping/category axes
    pub fn categorical_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.types)
            .filter(|(_, t)| **t != ColumnType::Numeric)
            .map(|(c, _)| c.name().to_string())
            .collect()
    }

    /// Extract the selected columns as aligned numeric vectors, dropping
    /// every row with a missing or non-numeric cell in any of them.
    ///
    /// Returns one `Vec<f64>` per requested name, all the same length.
    pub fn aligned_numeric(&self, names: &[String]) -> StatResult<Vec<Vec<f64>>> {
        let coerced: Vec<Vec<Option<f64>>> = names
            .iter()
            .map(|name| self.column(name).map(|c| c.coerce_numeric()))
            .collect::<StatResult<_>>()?;

        let mut out: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        'rows: for row in 0..self.rows {
            let mut values = Vec::with_capacity(names.len());
            for col in &coerced {
                match col[row] {
                    Some(v) => values.push(v),
                    None => continue 'rows,
                }
            }
            for (i, v) in values.into_iter().enumerate() {
                out[i].push(v);
            }
        }
        Ok(out)
    }

    /// Group a numeric column's values by the labels of another column,
    /// dropping rows missing on either side. Groups appear in order of
    /// first occurrence.
    pub fn grouped_numeric(
        &self,
        value_col: &str,
        group_col: &str,
    ) -> StatResult<Vec<(String, Vec<f64>)>> {
        let values = self.column(value_col)?.coerce_numeric();
        let labels = self.column(group_col)?;

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
        for row in 0..self.rows {
            let (Some(v), Some(label)) = (values[row], labels.cell(row)) else {
                continue;
            };
            if !groups.contains_key(label) {
                order.push(label.to_string());
            }
            groups.entry(label.to_string()).or_default().push(v);
        }

        Ok(order
            .into_iter()
            .map(|label| {
                let values = groups.remove(&label).unwrap_or_default();
                (label, values)
            })
            .collect())
    }

    /// Count duplicated rows (every occurrence after the first) and report
    /// up to [`DUPLICATE_INDEX_LIMIT`] of their 1-based indices.
    pub fn duplicate_rows(&self) -> (usize, Vec<usize>) {
        let mut seen: HashMap<Vec<Option<&str>>, ()> = HashMap::new();
        let mut count = 0;
        let mut indices = Vec::new();
        for row in 0..self.rows {
            let key: Vec<Option<&str>> = self.columns.iter().map(|c| c.cell(row)).collect();
            if seen.insert(key, ()).is_some() {
                count += 1;
                if indices.len() < DUPLICATE_INDEX_LIMIT {
                    indices.push(row + 1);
                }
            }
        }
        (count, indices)
    }
}

fn join_csv_row(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|cell| {
            if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "x,y,group\n1,2.0,a\n2,4.0,b\n3,,a\n4,8.0,b\n";

    #[test]
    fn test_from_csv_shape() {
        let ds = Dataset::from_csv(CSV.as_bytes()).unwrap();
        assert_eq!(ds.rows(), 4);
        assert_eq!(ds.cols(), 3);
        assert_eq!(ds.column_names(), vec!["x", "y", "group"]);
    }

    #[test]
    fn test_column_types_inferred_once() {
        let ds = Dataset::from_csv(CSV.as_bytes()).unwrap();
        // x has 4 distinct numeric values: low cardinality, treated as
        // categorical
        assert_eq!(ds.column_type("x").unwrap(), ColumnType::Categorical);
        assert_eq!(ds.column_type("group").unwrap(), ColumnType::Categorical);
        assert!(ds.column_type("missing").is_err());
    }

    #[test]
    fn test_column_not_found() {
        let ds = Dataset::from_csv(CSV.as_bytes()).unwrap();
        assert!(matches!(
            ds.column("missing"),
            Err(StatError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_aligned_numeric_drops_missing_rows() {
        let ds = Dataset::from_csv(CSV.as_bytes()).unwrap();
        let cols = ds
            .aligned_numeric(&["x".to_string(), "y".to_string()])
            .unwrap();
        assert_eq!(cols[0], vec![1.0, 2.0, 4.0]);
        assert_eq!(cols[1], vec![2.0, 4.0, 8.0]);
    }

    #[test]
    fn test_grouped_numeric() {
        let ds = Dataset::from_csv(CSV.as_bytes()).unwrap();
        let groups = ds.grouped_numeric("x", "group").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("a".to_string(), vec![1.0, 3.0]));
        assert_eq!(groups[1], ("b".to_string(), vec![2.0, 4.0]));
    }

    #[test]
    fn test_duplicate_rows() {
        let csv = "a,b\n1,x\n1,x\n2,y\n1,x\n";
        let ds = Dataset::from_csv(csv.as_bytes()).unwrap();
        let (count, indices) = ds.duplicate_rows();
        assert_eq!(count, 2);
        assert_eq!(indices, vec![2, 4]);
    }

    #[test]
    fn test_csv_round_trip() {
        let ds = Dataset::from_csv(CSV.as_bytes()).unwrap();
        let back = Dataset::from_csv(ds.to_csv().as_bytes()).unwrap();
        assert_eq!(back.rows(), ds.rows());
        assert_eq!(back.cols(), ds.cols());
        assert_eq!(back.column("y").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let cols = vec![
            Column::new("a", vec![Some("1".into())]),
            Column::new("b", vec![Some("1".into()), Some("2".into())]),
        ];
        assert!(Dataset::from_columns(cols).is_err());
    }
}
