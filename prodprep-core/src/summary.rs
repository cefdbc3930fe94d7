//! Run statistics and the artifact manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::clean::CleaningReport;
use crate::data::encode::CategoricalPolicy;
use crate::data::scale::ScalingPolicy;
use crate::data::source::DataSourceInfo;
use crate::data::split::SplitPercentages;

/// Configured partition percentages as written to the summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitInfo {
    pub train_percentage: f64,
    pub val_percentage: f64,
    pub test_percentage: f64,
}

impl From<SplitPercentages> for SplitInfo {
    fn from(p: SplitPercentages) -> Self {
        Self {
            train_percentage: p.train,
            val_percentage: p.validation,
            test_percentage: p.test,
        }
    }
}

/// Statistics of one pipeline run (`preprocessing_summary.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// `[rows, columns]` of the file as loaded.
    pub original_shape: [usize; 2],
    /// `[rows, columns]` after column drops and cleaning.
    pub final_shape_after_validation: [usize; 2],
    pub missing_values_removed: usize,
    pub duplicates_removed: usize,
    pub num_features: usize,
    pub num_classes: usize,
    pub split_info: SplitInfo,
}

impl RunSummary {
    pub fn new(
        original_shape: (usize, usize),
        final_shape: (usize, usize),
        cleaning: CleaningReport,
        num_features: usize,
        num_classes: usize,
        split: SplitPercentages,
    ) -> Self {
        Self {
            original_shape: [original_shape.0, original_shape.1],
            final_shape_after_validation: [final_shape.0, final_shape.1],
            missing_values_removed: cleaning.missing_removed,
            duplicates_removed: cleaning.duplicates_removed,
            num_features,
            num_classes,
            split_info: split.into(),
        }
    }
}

/// Realized row count of each partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionCounts {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

/// One emitted file and its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub name: String,
    pub sha256: String,
    pub bytes: u64,
}

/// Provenance of an artifact set (`manifest.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub source: DataSourceInfo,
    pub input_sha256: String,
    pub random_seed: u64,
    pub label_column: String,
    pub scaling: ScalingPolicy,
    pub categorical_encoding: CategoricalPolicy,
    pub partitions: PartitionCounts,
    #[serde(default)]
    pub files: Vec<ArtifactFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_field_names() {
        let summary = RunSummary::new(
            (1000, 9),
            (995, 9),
            CleaningReport {
                missing_removed: 3,
                duplicates_removed: 2,
            },
            12,
            4,
            SplitPercentages::default(),
        );
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["original_shape"], serde_json::json!([1000, 9]));
        assert_eq!(value["final_shape_after_validation"], serde_json::json!([995, 9]));
        assert_eq!(value["missing_values_removed"], 3);
        assert_eq!(value["duplicates_removed"], 2);
        assert_eq!(value["num_features"], 12);
        assert_eq!(value["num_classes"], 4);
        assert_eq!(value["split_info"]["train_percentage"], 70.0);
        assert_eq!(value["split_info"]["val_percentage"], 15.0);
        assert_eq!(value["split_info"]["test_percentage"], 15.0);
    }
}
