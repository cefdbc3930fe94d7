//! Versioned on-disk schema for fitted artifacts and partition files.
//!
//! Every fitted artifact is a JSON object carrying `schema_version` and
//! `kind` next to its own fields, e.g.
//!
//! ```json
//! { "schema_version": 1, "kind": "label_encoder", "column": "label", "classes": ["high", "low"] }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::encode::{FeatureEncoding, LabelEncoding};
use crate::data::scale::FeatureScaler;
use crate::data::table::FeatureMatrix;
use crate::error::{PrepError, Result};

/// Version written into every artifact; loading any other version fails.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

pub const SUMMARY_FILE: &str = "preprocessing_summary.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// A fitted object that is persisted for reuse on future data.
pub trait Artifact: Serialize + DeserializeOwned {
    /// Value of the `kind` field.
    const KIND: &'static str;
    /// File name inside the artifact directory.
    const FILE_NAME: &'static str;

    /// Invariants checked after deserializing.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

impl Artifact for LabelEncoding {
    const KIND: &'static str = "label_encoder";
    const FILE_NAME: &'static str = "label_encoder.json";

    fn check(&self) -> Result<()> {
        LabelEncoding::from_classes(self.column(), self.classes().to_vec()).map(|_| ())
    }
}

impl Artifact for FeatureEncoding {
    const KIND: &'static str = "feature_encoder";
    const FILE_NAME: &'static str = "feature_encoder.json";

    fn check(&self) -> Result<()> {
        let rebuilt = FeatureEncoding::from_columns(self.policy(), self.columns().to_vec());
        if rebuilt.output_names() != self.output_names() {
            return Err(PrepError::format(
                "feature encoder output names do not match its columns",
            ));
        }
        Ok(())
    }
}

impl Artifact for FeatureScaler {
    const KIND: &'static str = "feature_scaler";
    const FILE_NAME: &'static str = "feature_scaler.json";

    fn check(&self) -> Result<()> {
        let params = self
            .params()
            .ok_or_else(|| PrepError::not_fitted("persisted feature scaler has no parameters"))?;
        FeatureScaler::from_params(self.policy(), self.feature_names().to_vec(), params.to_vec())
            .map(|_| ())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema_version: u32,
    kind: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    kind: String,
    #[serde(flatten)]
    body: T,
}

/// Serialize an artifact with its schema header.
pub fn to_json<T: Artifact>(artifact: &T) -> Result<String> {
    let envelope = EnvelopeRef {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        kind: T::KIND,
        body: artifact,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse an artifact, rejecting the wrong kind or schema version.
pub fn from_json<T: Artifact>(text: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(text)
        .map_err(|e| PrepError::format(format!("invalid {} artifact: {e}", T::KIND)))?;
    if envelope.kind != T::KIND {
        return Err(PrepError::format(format!(
            "expected a {} artifact, found '{}'",
            T::KIND,
            envelope.kind
        )));
    }
    if envelope.schema_version != ARTIFACT_SCHEMA_VERSION {
        return Err(PrepError::format(format!(
            "unsupported {} schema version {} (expected {})",
            T::KIND,
            envelope.schema_version,
            ARTIFACT_SCHEMA_VERSION
        )));
    }
    envelope.body.check()?;
    Ok(envelope.body)
}

/// Load `T::FILE_NAME` from an artifact directory.
pub fn load_artifact<T: Artifact>(dir: &Path) -> Result<T> {
    let path = dir.join(T::FILE_NAME);
    let text = std::fs::read_to_string(&path)?;
    from_json(&text)
}

/// Load `T::FILE_NAME` if present.
pub fn load_optional_artifact<T: Artifact>(dir: &Path) -> Result<Option<T>> {
    if !dir.join(T::FILE_NAME).exists() {
        return Ok(None);
    }
    load_artifact(dir).map(Some)
}

/// Render features plus a trailing label-code column as CSV bytes.
pub fn partition_csv(
    features: &FeatureMatrix,
    labels: &[usize],
    label_column: &str,
) -> Result<Vec<u8>> {
    if features.row_count() != labels.len() {
        return Err(PrepError::format(format!(
            "{} feature rows but {} labels",
            features.row_count(),
            labels.len()
        )));
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(
        features
            .columns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(label_column)),
    )?;
    for (row, label) in features.rows.iter().zip(labels) {
        let mut record: Vec<String> = row.iter().map(f64::to_string).collect();
        record.push(label.to_string());
        writer.write_record(&record)?;
    }
    writer
        .into_inner()
        .map_err(|e| PrepError::Io(e.into_error()))
}

/// Render a feature matrix (no label column) as CSV bytes.
pub fn matrix_csv(features: &FeatureMatrix) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&features.columns)?;
    for row in &features.rows {
        writer.write_record(row.iter().map(f64::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| PrepError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encode::{CategoricalPolicy, FeatureColumn, FeatureKind};
    use crate::data::scale::{ScaleParam, ScalingPolicy};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_label_encoder_schema() {
        let enc = LabelEncoding::fit("label", ["low", "high"]).unwrap();
        let json = to_json(&enc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "schema_version": 1,
                "kind": "label_encoder",
                "column": "label",
                "classes": ["high", "low"],
            })
        );
        let back: LabelEncoding = from_json(&json).unwrap();
        assert_eq!(back, enc);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let enc = LabelEncoding::fit("label", ["a"]).unwrap();
        let json = to_json(&enc).unwrap();
        let err = from_json::<FeatureScaler>(&json).unwrap_err();
        assert!(matches!(err, PrepError::Format(_)));
    }

    #[test]
    fn test_future_version_rejected() {
        let json = r#"{"schema_version": 2, "kind": "label_encoder", "column": "l", "classes": ["a"]}"#;
        let err = from_json::<LabelEncoding>(json).unwrap_err();
        assert!(matches!(err, PrepError::Format(_)));
    }

    #[test]
    fn test_unsorted_classes_rejected() {
        let json = r#"{"schema_version": 1, "kind": "label_encoder", "column": "l", "classes": ["b", "a"]}"#;
        assert!(from_json::<LabelEncoding>(json).is_err());
    }

    #[test]
    fn test_scaler_and_feature_encoder_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let scaler = FeatureScaler::from_params(
            ScalingPolicy::Standard,
            vec!["smv".into()],
            vec![ScaleParam {
                location: 2.0,
                scale: 0.5,
            }],
        )
        .unwrap();
        let features = FeatureEncoding::from_columns(
            CategoricalPolicy::OneHot,
            vec![FeatureColumn {
                name: "team".into(),
                kind: FeatureKind::Categorical {
                    categories: vec!["a".into(), "b".into()],
                },
            }],
        );
        std::fs::write(dir.path().join(FeatureScaler::FILE_NAME), to_json(&scaler).unwrap()).unwrap();
        std::fs::write(
            dir.path().join(FeatureEncoding::FILE_NAME),
            to_json(&features).unwrap(),
        )
        .unwrap();

        assert_eq!(load_artifact::<FeatureScaler>(dir.path()).unwrap(), scaler);
        assert_eq!(load_artifact::<FeatureEncoding>(dir.path()).unwrap(), features);
        assert!(load_optional_artifact::<LabelEncoding>(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_unfitted_scaler_artifact_rejected() {
        let json = to_json(&FeatureScaler::new(ScalingPolicy::Standard)).unwrap();
        let err = from_json::<FeatureScaler>(&json).unwrap_err();
        assert!(matches!(err, PrepError::NotFitted(_)));
    }

    #[test]
    fn test_partition_csv() {
        let m = FeatureMatrix::new(vec!["a".into(), "b".into()], vec![vec![0.5, -1.0]]);
        let bytes = partition_csv(&m, &[3], "label").unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b,label\n0.5,-1,3\n");
        assert!(partition_csv(&m, &[], "label").is_err());
    }
}
