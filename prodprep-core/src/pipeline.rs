//! The preprocessing pipeline and its state machine.
//!
//! `Idle → Loaded → Cleaned → Encoded → Split → Scaled → Emitted`, with a
//! terminal `Failed` reachable from every stage. Transitions only move
//! forward and a [`Preprocessor`] runs at most once.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::artifacts::ARTIFACT_SCHEMA_VERSION;
use crate::config::PrepConfig;
use crate::data::clean::clean;
use crate::data::encode::{EncodedTable, FeatureEncoding, LabelEncoding, encode};
use crate::data::scale::FeatureScaler;
use crate::data::source::{CsvSource, TableSource};
use crate::data::split::split_indices;
use crate::emit::{ArtifactSet, emit};
use crate::error::{PrepError, Result};
use crate::partition::{Partition, PartitionName};
use crate::persistence;
use crate::summary::{ArtifactManifest, PartitionCounts, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Loaded,
    Cleaned,
    Encoded,
    Split,
    Scaled,
    Emitted,
    Failed,
}

impl PipelineStage {
    /// The stage a successful step moves to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Loaded),
            Self::Loaded => Some(Self::Cleaned),
            Self::Cleaned => Some(Self::Encoded),
            Self::Encoded => Some(Self::Split),
            Self::Split => Some(Self::Scaled),
            Self::Scaled => Some(Self::Emitted),
            Self::Emitted | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Emitted | Self::Failed)
    }
}

/// Result of a successful run, without re-reading any file.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
    pub label_encoding: LabelEncoding,
    pub feature_encoding: FeatureEncoding,
    pub scaler: FeatureScaler,
    pub summary: RunSummary,
    pub manifest: ArtifactManifest,
    pub output_dir: PathBuf,
}

impl PreprocessOutput {
    pub fn partition(&self, name: PartitionName) -> &Partition {
        match name {
            PartitionName::Train => &self.train,
            PartitionName::Validation => &self.validation,
            PartitionName::Test => &self.test,
        }
    }

    pub fn num_features(&self) -> usize {
        self.feature_encoding.num_features()
    }
}

/// Runs the pipeline once for a given configuration.
#[derive(Debug)]
pub struct Preprocessor {
    config: PrepConfig,
    stage: PipelineStage,
    failed_during: Option<PipelineStage>,
}

impl Preprocessor {
    pub fn new(config: PrepConfig) -> Self {
        Self {
            config,
            stage: PipelineStage::Idle,
            failed_during: None,
        }
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// The stage that was being attempted when the run failed.
    pub fn failed_during(&self) -> Option<PipelineStage> {
        self.failed_during
    }

    /// Run every stage on `input`. The first error aborts the run and is
    /// returned unchanged.
    pub fn run(&mut self, input: &Path) -> Result<PreprocessOutput> {
        if self.stage != PipelineStage::Idle {
            return Err(PrepError::config(format!(
                "preprocessor already ran (stage {:?})",
                self.stage
            )));
        }
        match self.execute(input) {
            Ok(output) => Ok(output),
            Err(e) => {
                self.failed_during = self.stage.next();
                self.stage = PipelineStage::Failed;
                tracing::error!(
                    stage = ?self.failed_during,
                    kind = e.kind().as_str(),
                    error = %e,
                    "Preprocessing failed"
                );
                Err(e)
            }
        }
    }

    fn advance(&mut self, to: PipelineStage) {
        debug_assert_eq!(self.stage.next(), Some(to));
        tracing::debug!(from = ?self.stage, to = ?to, "Pipeline stage");
        self.stage = to;
    }

    fn execute(&mut self, input: &Path) -> Result<PreprocessOutput> {
        let config = self.config.clone();
        config.validate()?;
        let label_column = config.label_column.as_str();

        // Load
        let source = CsvSource::new(input).with_delimiter(config.delimiter);
        let mut raw = source.load()?;
        let original_shape = raw.shape();
        raw.drop_columns(&config.drop_columns)?;
        if raw.column_index(label_column).is_none() {
            return Err(PrepError::format(format!(
                "label column '{label_column}' not found in '{}'",
                input.display()
            )));
        }
        if raw.column_count() < 2 {
            return Err(PrepError::format("input has no feature columns"));
        }
        let input_sha256 = persistence::hash_file(input)?;
        let mut source_info = source.source_info();
        source_info.row_count = Some(original_shape.0);
        tracing::info!(
            path = %input.display(),
            rows = original_shape.0,
            columns = original_shape.1,
            "Loaded input"
        );
        self.advance(PipelineStage::Loaded);

        // Clean
        let (table, cleaning) = clean(raw, &config.missing_markers)?;
        tracing::info!(
            rows = table.row_count(),
            missing_removed = cleaning.missing_removed,
            duplicates_removed = cleaning.duplicates_removed,
            "Cleaned table"
        );
        self.advance(PipelineStage::Cleaned);

        // Encode
        let (encoded, label_encoding, feature_encoding) =
            encode(&table, label_column, config.categorical_encoding)?;
        tracing::info!(
            num_classes = label_encoding.num_classes(),
            num_features = feature_encoding.num_features(),
            "Encoded table"
        );
        self.advance(PipelineStage::Encoded);

        // Split
        let split = split_indices(encoded.row_count(), config.split, config.random_seed)?;
        tracing::info!(
            train = split.train.len(),
            validation = split.validation.len(),
            test = split.test.len(),
            seed = config.random_seed,
            "Split rows"
        );
        self.advance(PipelineStage::Split);

        // Scale: fit on train only, apply to all three.
        let mut scaler = FeatureScaler::new(config.scaling);
        let train_raw = select(&encoded, &split.train);
        scaler.fit(&train_raw.features)?;
        let train = scale(&scaler, train_raw)?;
        let validation = scale(&scaler, select(&encoded, &split.validation))?;
        let test = scale(&scaler, select(&encoded, &split.test))?;
        tracing::info!(policy = ?config.scaling, "Scaled features");
        self.advance(PipelineStage::Scaled);

        // Emit
        let summary = RunSummary::new(
            original_shape,
            table.shape(),
            cleaning,
            feature_encoding.num_features(),
            label_encoding.num_classes(),
            config.split,
        );
        let manifest = ArtifactManifest {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            run_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now(),
            source: source_info,
            input_sha256,
            random_seed: config.random_seed,
            label_column: label_column.to_string(),
            scaling: config.scaling,
            categorical_encoding: config.categorical_encoding,
            partitions: PartitionCounts {
                train: train.row_count(),
                validation: validation.row_count(),
                test: test.row_count(),
            },
            files: Vec::new(),
        };
        let set = ArtifactSet {
            label_column,
            train: &train,
            validation: &validation,
            test: &test,
            label_encoding: &label_encoding,
            feature_encoding: &feature_encoding,
            scaler: &scaler,
            summary: &summary,
        };
        let manifest = emit(&set, manifest, &config.output_directory)?;
        self.advance(PipelineStage::Emitted);

        Ok(PreprocessOutput {
            train,
            validation,
            test,
            label_encoding,
            feature_encoding,
            scaler,
            summary,
            manifest,
            output_dir: config.output_directory.clone(),
        })
    }
}

fn select(encoded: &EncodedTable, indices: &[usize]) -> Partition {
    Partition {
        features: encoded.features.select_rows(indices),
        labels: indices.iter().map(|&i| encoded.labels[i]).collect(),
    }
}

fn scale(scaler: &FeatureScaler, part: Partition) -> Result<Partition> {
    Ok(Partition {
        features: scaler.transform(&part.features)?,
        labels: part.labels,
    })
}
