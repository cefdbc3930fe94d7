//! In-memory table types passed between pipeline stages.

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Rows of string cells exactly as loaded from the source file.
///
/// May contain missing cells and duplicate rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Remove the named columns from the header and every row.
    pub fn drop_columns(&mut self, names: &[String]) -> Result<()> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.column_index(name).ok_or_else(|| {
                PrepError::format(format!("cannot drop unknown column '{name}'"))
            })?;
            indices.push(idx);
        }
        indices.sort_unstable();
        indices.dedup();

        for idx in indices.into_iter().rev() {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        Ok(())
    }
}

/// A [`RawTable`] with missing-valued and duplicate rows removed.
///
/// Only the cleaner constructs it, so holding one means no cell is missing
/// and no two rows are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CleanTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over the values of one column.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }
}

/// Named numeric columns with row-major storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`, the same shape a downstream trainer sees.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Copy out the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Iterate over the values of one column.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = f64> + Clone + '_ {
        self.rows.iter().map(move |row| row[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable::new(
            vec!["id".into(), "team".into(), "label".into()],
            vec![
                vec!["1".into(), "a".into(), "high".into()],
                vec!["2".into(), "b".into(), "low".into()],
            ],
        )
    }

    #[test]
    fn test_drop_columns() {
        let mut table = sample();
        table.drop_columns(&["id".to_string()]).unwrap();
        assert_eq!(table.columns, vec!["team", "label"]);
        assert_eq!(table.rows[1], vec!["b", "low"]);
        assert_eq!(table.shape(), (2, 2));
    }

    #[test]
    fn test_drop_unknown_column() {
        let mut table = sample();
        let err = table.drop_columns(&["wage".to_string()]).unwrap_err();
        assert!(matches!(err, PrepError::Format(_)));
    }

    #[test]
    fn test_select_rows() {
        let matrix = FeatureMatrix::new(
            vec!["x".into()],
            vec![vec![1.0], vec![2.0], vec![3.0]],
        );
        let picked = matrix.select_rows(&[2, 0]);
        assert_eq!(picked.rows, vec![vec![3.0], vec![1.0]]);
        assert_eq!(picked.shape(), (2, 1));
    }
}
