//! # prodprep-core: data preparation for worker productivity models
//!
//! Turns a raw labeled CSV into model-ready artifacts: cleaned, encoded,
//! scaled train/validation/test matrices plus the fitted transformers needed
//! to encode future data the same way.
//!
//! ## Pipeline
//!
//! 1. **Load**: delimited text with a header row ([`data::source`])
//! 2. **Clean**: drop rows with missing cells, then exact duplicates ([`data::clean`])
//! 3. **Encode**: label codes and numeric features ([`data::encode`])
//! 4. **Split**: seeded train/validation/test assignment ([`data::split`])
//! 5. **Scale**: fitted on train only, applied to all partitions ([`data::scale`])
//! 6. **Emit**: atomic artifact directory ([`emit`])

pub mod apply;
pub mod artifacts;
pub mod config;
pub mod data;
pub mod emit;
pub mod error;
pub mod partition;
pub mod persistence;
pub mod pipeline;
pub mod summary;

pub use apply::{AppliedTable, FittedArtifacts, apply_to_file};
pub use config::{ConfigOverrides, PrepConfig, load_config};
pub use data::{
    CategoricalPolicy, FeatureEncoding, FeatureMatrix, FeatureScaler, LabelEncoding,
    ScalingPolicy, SplitPercentages,
};
pub use error::{PrepError, PrepErrorKind, Result};
pub use partition::{Partition, PartitionName};
pub use pipeline::{PipelineStage, PreprocessOutput, Preprocessor};
pub use summary::{ArtifactManifest, RunSummary};

use std::path::Path;

/// Run the whole pipeline on `input` with `config`.
pub fn run_preprocessing(input: &Path, config: &PrepConfig) -> Result<PreprocessOutput> {
    Preprocessor::new(config.clone()).run(input)
}
