//! Configuration system for prodprep.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace `prodprep.toml` -> environment -> explicit overrides (CLI flags).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::encode::CategoricalPolicy;
use crate::data::scale::ScalingPolicy;
use crate::data::split::SplitPercentages;
use crate::error::{PrepError, Result};

/// Name of the workspace-level configuration file.
pub const CONFIG_FILE_NAME: &str = "prodprep.toml";

/// Configuration for a single preprocessing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Seed for the train/validation/test assignment.
    #[serde(default = "default_seed")]
    pub random_seed: u64,
    /// Directory that receives the artifact set.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Name of the categorical target column.
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Partition percentages.
    #[serde(default)]
    pub split: SplitPercentages,
    /// Feature normalization applied after splitting.
    #[serde(default)]
    pub scaling: ScalingPolicy,
    /// How categorical feature columns are turned into numbers.
    #[serde(default)]
    pub categorical_encoding: CategoricalPolicy,
    /// Field delimiter of the input file.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Cell values treated as missing (compared after trimming).
    #[serde(default = "default_missing_markers")]
    pub missing_markers: Vec<String>,
    /// Columns removed right after loading (identifiers, free text, dates).
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            random_seed: default_seed(),
            output_directory: default_output_directory(),
            label_column: default_label_column(),
            split: SplitPercentages::default(),
            scaling: ScalingPolicy::default(),
            categorical_encoding: CategoricalPolicy::default(),
            delimiter: default_delimiter(),
            missing_markers: default_missing_markers(),
            drop_columns: Vec::new(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_label_column() -> String {
    "label".to_string()
}

fn default_delimiter() -> char {
    ','
}

pub(crate) fn default_missing_markers() -> Vec<String> {
    ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl PrepConfig {
    /// Reject configurations that can never produce a valid run, before any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.label_column.trim().is_empty() {
            return Err(PrepError::config("label_column must not be empty"));
        }
        if self.drop_columns.iter().any(|c| c == &self.label_column) {
            return Err(PrepError::config(format!(
                "label column '{}' is also listed in drop_columns",
                self.label_column
            )));
        }
        if !self.delimiter.is_ascii() || self.delimiter == '"' {
            return Err(PrepError::config(format!(
                "unsupported delimiter {:?}",
                self.delimiter
            )));
        }
        self.split.validate()?;
        Ok(())
    }

    /// Render the configuration as a `prodprep.toml` document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PrepError::config(e.to_string()))
    }
}

/// Partial configuration supplied by the caller (usually CLI flags).
///
/// Only the fields that are `Some` override lower layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitPercentages>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical_encoding: Option<CategoricalPolicy>,
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "prodprep", "prodprep")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides
/// 2. Environment variables (prefixed with `PRODPREP_`, nested with `__`)
/// 3. Explicit config file, or workspace `prodprep.toml`
/// 4. User config (`~/.config/prodprep/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<PrepConfig> {
    let mut figment = Figment::from(Serialized::defaults(PrepConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    match (config_file, workspace) {
        (Some(file), _) => {
            if !file.exists() {
                return Err(PrepError::config(format!(
                    "config file '{}' does not exist",
                    file.display()
                )));
            }
            figment = figment.merge(Toml::file(file));
        }
        (None, Some(ws)) => {
            let ws_config = ws.join(CONFIG_FILE_NAME);
            if ws_config.exists() {
                figment = figment.merge(Toml::file(&ws_config));
            }
        }
        (None, None) => {}
    }

    figment = figment.merge(Env::prefixed("PRODPREP_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: PrepConfig = figment
        .extract()
        .map_err(|e| PrepError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
