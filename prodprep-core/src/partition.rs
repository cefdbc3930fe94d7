//! Named train/validation/test partitions of the encoded table.

use serde::{Deserialize, Serialize};

use crate::data::table::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionName {
    Train,
    Validation,
    Test,
}

impl PartitionName {
    pub const ALL: [PartitionName; 3] = [Self::Train, Self::Validation, Self::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }

    /// CSV file holding this partition in the artifact directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Train => "data_train.csv",
            Self::Validation => "data_validation.csv",
            Self::Test => "data_test.csv",
        }
    }
}

impl std::fmt::Display for PartitionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scaled features and class codes of one partition, row aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: FeatureMatrix,
    pub labels: Vec<usize>,
}

impl Partition {
    pub fn row_count(&self) -> usize {
        self.labels.len()
    }

    /// `(rows, features)`.
    pub fn shape(&self) -> (usize, usize) {
        self.features.shape()
    }
}
