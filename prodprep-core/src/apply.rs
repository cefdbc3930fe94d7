//! Re-applying persisted encoders and scaler to new data.

use std::path::Path;

use crate::artifacts::{load_artifact, load_optional_artifact, matrix_csv, partition_csv};
use crate::data::encode::{FeatureEncoding, LabelEncoding};
use crate::data::scale::FeatureScaler;
use crate::data::source::{CsvSource, TableSource};
use crate::data::table::{FeatureMatrix, RawTable};
use crate::error::{PrepError, Result};

/// The fitted transformers of a previous run.
#[derive(Debug, Clone)]
pub struct FittedArtifacts {
    pub label_encoding: Option<LabelEncoding>,
    pub feature_encoding: FeatureEncoding,
    pub scaler: FeatureScaler,
}

/// New data after encoding and scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTable {
    pub features: FeatureMatrix,
    /// Class codes, present when the input carried the label column.
    pub labels: Option<Vec<usize>>,
    pub label_column: Option<String>,
}

impl AppliedTable {
    /// Render as CSV, with a trailing label-code column when labels are present.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        match (&self.labels, &self.label_column) {
            (Some(labels), Some(column)) => partition_csv(&self.features, labels, column),
            _ => matrix_csv(&self.features),
        }
    }
}

impl FittedArtifacts {
    /// Load the feature encoder and scaler (required) and the label encoder
    /// (optional) from an artifact directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let feature_encoding: FeatureEncoding = load_artifact(dir)?;
        let scaler: FeatureScaler = load_artifact(dir)?;
        if scaler.feature_names() != feature_encoding.output_names() {
            return Err(PrepError::format(
                "feature scaler and feature encoder describe different features",
            ));
        }
        Ok(Self {
            label_encoding: load_optional_artifact(dir)?,
            feature_encoding,
            scaler,
        })
    }

    /// Encode and scale `table`; labels are encoded when the label column is present.
    pub fn transform(&self, table: &RawTable) -> Result<AppliedTable> {
        let encoded = self.feature_encoding.transform(&table.columns, &table.rows)?;
        let features = self.scaler.transform(&encoded)?;

        let labelled = self
            .label_encoding
            .as_ref()
            .and_then(|enc| table.column_index(enc.column()).map(|idx| (enc, idx)));
        let (labels, label_column) = match labelled {
            Some((enc, idx)) => {
                let codes = table
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let cell = row.get(idx).ok_or_else(|| {
                            PrepError::format(format!("row {i} is shorter than the header"))
                        })?;
                        enc.encode(cell)
                    })
                    .collect::<Result<Vec<_>>>()?;
                (Some(codes), Some(enc.column().to_string()))
            }
            None => (None, None),
        };

        Ok(AppliedTable {
            features,
            labels,
            label_column,
        })
    }

    /// Map class codes back to label strings.
    pub fn decode_labels(&self, codes: &[usize]) -> Result<Vec<String>> {
        let enc = self
            .label_encoding
            .as_ref()
            .ok_or_else(|| PrepError::not_fitted("artifact directory has no label encoder"))?;
        codes
            .iter()
            .map(|&c| enc.decode(c).map(str::to_string))
            .collect()
    }
}

/// Load a delimited file and run it through the artifacts in `artifacts_dir`.
pub fn apply_to_file(input: &Path, artifacts_dir: &Path, delimiter: char) -> Result<AppliedTable> {
    let fitted = FittedArtifacts::load(artifacts_dir)?;
    let table = CsvSource::new(input).with_delimiter(delimiter).load()?;
    let applied = fitted.transform(&table)?;
    tracing::info!(
        rows = applied.features.row_count(),
        features = applied.features.column_count(),
        labelled = applied.labels.is_some(),
        "Applied artifacts"
    );
    Ok(applied)
}
