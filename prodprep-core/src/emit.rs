//! Emitter stage: writes the artifact set as one unit.
//!
//! All files are rendered in memory, written into a hidden staging directory
//! next to the output directory and then swapped into place. A failed or
//! aborted run therefore leaves either the previous complete set or nothing.

use std::path::Path;

use crate::artifacts::{self, Artifact, MANIFEST_FILE, SUMMARY_FILE};
use crate::data::encode::{FeatureEncoding, LabelEncoding};
use crate::data::scale::FeatureScaler;
use crate::error::{PrepError, Result};
use crate::partition::{Partition, PartitionName};
use crate::persistence;
use crate::summary::{ArtifactFile, ArtifactManifest, RunSummary};

/// Everything a run persists.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSet<'a> {
    pub label_column: &'a str,
    pub train: &'a Partition,
    pub validation: &'a Partition,
    pub test: &'a Partition,
    pub label_encoding: &'a LabelEncoding,
    pub feature_encoding: &'a FeatureEncoding,
    pub scaler: &'a FeatureScaler,
    pub summary: &'a RunSummary,
}

impl ArtifactSet<'_> {
    fn partition(&self, name: PartitionName) -> &Partition {
        match name {
            PartitionName::Train => self.train,
            PartitionName::Validation => self.validation,
            PartitionName::Test => self.test,
        }
    }

    /// Render every file except the manifest, in a fixed order.
    fn render(&self) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::with_capacity(7);
        for name in PartitionName::ALL {
            let part = self.partition(name);
            files.push((
                name.file_name(),
                artifacts::partition_csv(&part.features, &part.labels, self.label_column)?,
            ));
        }
        files.push((
            LabelEncoding::FILE_NAME,
            artifacts::to_json(self.label_encoding)?.into_bytes(),
        ));
        files.push((
            FeatureEncoding::FILE_NAME,
            artifacts::to_json(self.feature_encoding)?.into_bytes(),
        ));
        files.push((
            FeatureScaler::FILE_NAME,
            artifacts::to_json(self.scaler)?.into_bytes(),
        ));
        files.push((
            SUMMARY_FILE,
            serde_json::to_string_pretty(self.summary)?.into_bytes(),
        ));
        Ok(files)
    }
}

/// Write `set` plus its manifest to `output_dir`, replacing any previous set.
///
/// Returns the manifest with the digest of every written file filled in.
pub fn emit(
    set: &ArtifactSet<'_>,
    mut manifest: ArtifactManifest,
    output_dir: &Path,
) -> Result<ArtifactManifest> {
    if output_dir.exists() && !output_dir.is_dir() {
        return Err(PrepError::config(format!(
            "output path '{}' exists and is not a directory",
            output_dir.display()
        )));
    }
    let staging = persistence::sibling_temp_dir(output_dir, "staging")
        .map_err(|e| PrepError::config(e.to_string()))?;

    let files = set.render()?;
    manifest.files = files
        .iter()
        .map(|(name, bytes)| ArtifactFile {
            name: name.to_string(),
            sha256: persistence::hash_bytes(bytes),
            bytes: bytes.len() as u64,
        })
        .collect();
    let manifest_bytes = serde_json::to_string_pretty(&manifest)?.into_bytes();

    if let Some(parent) = staging.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir(&staging)?;

    let written = write_files(&staging, &files, &manifest_bytes)
        .and_then(|()| persistence::promote_dir(&staging, output_dir));
    if let Err(e) = written {
        if staging.exists() {
            if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %cleanup,
                    "Could not remove staging directory"
                );
            }
        }
        return Err(e.into());
    }

    tracing::info!(
        output = %output_dir.display(),
        files = manifest.files.len() + 1,
        "Emitted artifacts"
    );
    Ok(manifest)
}

fn write_files(
    dir: &Path,
    files: &[(&'static str, Vec<u8>)],
    manifest: &[u8],
) -> std::io::Result<()> {
    for (name, bytes) in files {
        std::fs::write(dir.join(name), bytes)?;
    }
    std::fs::write(dir.join(MANIFEST_FILE), manifest)
}
