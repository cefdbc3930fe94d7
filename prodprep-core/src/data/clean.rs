//! Cleaner stage: missing-value and duplicate row removal.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::table::{CleanTable, RawTable};
use crate::error::{PrepError, Result};

/// Row counts removed by [`clean`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub missing_removed: usize,
    pub duplicates_removed: usize,
}

/// Whether `cell` counts as missing under `markers`.
///
/// Cells arrive trimmed from the loader, so an empty cell is always missing.
pub fn is_missing(cell: &str, markers: &[String]) -> bool {
    let cell = cell.trim();
    cell.is_empty() || markers.iter().any(|m| m == cell)
}

/// Drop rows with any missing cell, then rows identical to an earlier kept row.
///
/// First-occurrence order is preserved. Fails with `EmptyDataset` when no
/// row survives.
pub fn clean(raw: RawTable, markers: &[String]) -> Result<(CleanTable, CleaningReport)> {
    let RawTable { columns, rows } = raw;
    let original = rows.len();

    let complete: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| !row.iter().any(|cell| is_missing(cell, markers)))
        .collect();
    let missing_removed = original - complete.len();

    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(complete.len());
    let mut kept = Vec::with_capacity(complete.len());
    for row in complete {
        if seen.insert(row.clone()) {
            kept.push(row);
        }
    }
    let duplicates_removed = original - missing_removed - kept.len();

    let report = CleaningReport {
        missing_removed,
        duplicates_removed,
    };

    if kept.is_empty() {
        return Err(PrepError::empty_dataset(format!(
            "no rows left after cleaning {original} rows \
             ({missing_removed} with missing values, {duplicates_removed} duplicates)"
        )));
    }

    if missing_removed > 0 || duplicates_removed > 0 {
        tracing::warn!(
            missing_removed,
            duplicates_removed,
            remaining = kept.len(),
            "Removed incomplete or duplicate rows"
        );
    }

    Ok((CleanTable::new(columns, kept), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_missing_markers;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_removes_missing_then_duplicates() {
        let raw = RawTable::new(
            row(&["a", "label"]),
            vec![
                row(&["1", "x"]),
                row(&["", "y"]),
                row(&["1", "x"]),
                row(&["2", "NA"]),
                row(&["3", "z"]),
            ],
        );
        let (table, report) = clean(raw, &default_missing_markers()).unwrap();
        assert_eq!(report.missing_removed, 2);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(table.rows(), &[row(&["1", "x"]), row(&["3", "z"])]);
    }

    #[test]
    fn test_duplicate_of_missing_row_counts_as_missing() {
        let raw = RawTable::new(
            row(&["a", "label"]),
            vec![row(&["1", ""]), row(&["1", ""]), row(&["2", "x"])],
        );
        let (table, report) = clean(raw, &default_missing_markers()).unwrap();
        assert_eq!(report.missing_removed, 2);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_all_rows_missing_is_empty_dataset() {
        let raw = RawTable::new(
            row(&["a", "label"]),
            vec![row(&["1", ""]), row(&["null", "x"])],
        );
        let err = clean(raw, &default_missing_markers()).unwrap_err();
        assert!(matches!(err, PrepError::EmptyDataset(_)));
    }

    #[test]
    fn test_custom_markers() {
        assert!(is_missing("?", &["?".to_string()]));
        assert!(!is_missing("?", &default_missing_markers()));
        assert!(is_missing("   ", &[]));
    }
}
