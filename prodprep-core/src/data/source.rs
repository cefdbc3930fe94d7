//! Table sources: the Loader stage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::data::table::RawTable;
use crate::error::{PrepError, Result};

/// Information about a data source for the run manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub source_type: String,
    pub location: String,
    pub accessed_at: chrono::DateTime<chrono::Utc>,
    pub row_count: Option<usize>,
}

/// Trait for loading a raw table from a source.
pub trait TableSource {
    /// Read the whole source into memory.
    fn load(&self) -> Result<RawTable>;

    /// Return metadata about this source.
    fn source_info(&self) -> DataSourceInfo;
}

/// Delimited text file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: ',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii())
            .ok_or_else(|| PrepError::config(format!("unsupported delimiter {:?}", self.delimiter)))
    }
}

impl TableSource for CsvSource {
    fn load(&self) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter_byte()?)
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(PrepError::format(format!(
                "'{}' has no header row",
                self.path.display()
            )));
        }

        let mut seen = HashSet::new();
        for name in &columns {
            if name.is_empty() {
                return Err(PrepError::format("header contains an empty column name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(PrepError::format(format!(
                    "header contains duplicate column '{name}'"
                )));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(
            path = %self.path.display(),
            rows = rows.len(),
            columns = columns.len(),
            "Loaded CSV"
        );
        Ok(RawTable::new(columns, rows))
    }

    fn source_info(&self) -> DataSourceInfo {
        DataSourceInfo {
            source_type: "csv".to_string(),
            location: self.path.display().to_string(),
            accessed_at: chrono::Utc::now(),
            row_count: None,
        }
    }
}
