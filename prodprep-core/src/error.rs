//! Error types for the prodprep-core crate.

use thiserror::Error;

/// Top-level error type for preprocessing operations.
///
/// Every pipeline stage fails fast with one of these; nothing is recovered
/// or defaulted inside the pipeline.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Unseen label in column '{column}': '{value}'")]
    UnseenLabel { column: String, value: String },

    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Coarse classification of a [`PrepError`], stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrepErrorKind {
    Io,
    Format,
    EmptyDataset,
    UnseenLabel,
    InvalidSplit,
    NotFitted,
    Config,
    Serialization,
}

impl PrepErrorKind {
    /// Process exit code reported to the orchestrator.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Io => 2,
            Self::Format => 3,
            Self::EmptyDataset => 4,
            Self::UnseenLabel => 5,
            Self::InvalidSplit => 6,
            Self::NotFitted => 7,
            Self::Config => 8,
            Self::Serialization => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Format => "format",
            Self::EmptyDataset => "empty_dataset",
            Self::UnseenLabel => "unseen_label",
            Self::InvalidSplit => "invalid_split",
            Self::NotFitted => "not_fitted",
            Self::Config => "config",
            Self::Serialization => "serialization",
        }
    }
}

impl PrepError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn empty_dataset(msg: impl Into<String>) -> Self {
        Self::EmptyDataset(msg.into())
    }

    pub fn unseen_label(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnseenLabel {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn invalid_split(msg: impl Into<String>) -> Self {
        Self::InvalidSplit(msg.into())
    }

    pub fn not_fitted(msg: impl Into<String>) -> Self {
        Self::NotFitted(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> PrepErrorKind {
        match self {
            Self::Io(_) => PrepErrorKind::Io,
            Self::Format(_) => PrepErrorKind::Format,
            Self::EmptyDataset(_) => PrepErrorKind::EmptyDataset,
            Self::UnseenLabel { .. } => PrepErrorKind::UnseenLabel,
            Self::InvalidSplit(_) => PrepErrorKind::InvalidSplit,
            Self::NotFitted(_) => PrepErrorKind::NotFitted,
            Self::Config(_) => PrepErrorKind::Config,
            Self::Serde(_) => PrepErrorKind::Serialization,
        }
    }
}

impl From<csv::Error> for PrepError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::Format(format!("{other:?}")),
            }
        } else {
            Self::Format(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
