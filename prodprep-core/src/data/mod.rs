//! Data preparation stages: loading, cleaning, encoding, splitting and scaling.

pub mod clean;
pub mod encode;
pub mod scale;
pub mod source;
pub mod split;
pub mod table;

pub use clean::{CleaningReport, clean};
pub use encode::{
    CategoricalPolicy, EncodedTable, FeatureColumn, FeatureEncoding, FeatureKind, LabelEncoding,
    encode,
};
pub use scale::{FeatureScaler, ScaleParam, ScalingPolicy};
pub use source::{CsvSource, DataSourceInfo, TableSource};
pub use split::{Split, SplitPercentages, split_indices};
pub use table::{CleanTable, FeatureMatrix, RawTable};
