//! Scaler stage: per-feature normalization fitted on the training partition.
//!
//! A feature is mapped to `(x - location) / scale`. When the fitted spread of
//! a feature is below [`MIN_SCALE`] (constant column in train), its scale is
//! fixed to `1.0`: the feature is only shifted, never divided by ~0.

use serde::{Deserialize, Serialize};

use crate::data::table::FeatureMatrix;
use crate::error::{PrepError, Result};

/// Spreads below this are treated as zero.
pub const MIN_SCALE: f64 = 1e-12;

/// Which normalization to fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingPolicy {
    /// Mean and population standard deviation.
    #[default]
    Standard,
    /// Minimum and range; train maps into `[0, 1]`.
    MinMax,
    /// Identity.
    None,
}

impl std::str::FromStr for ScalingPolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" | "zscore" | "z_score" => Ok(Self::Standard),
            "min_max" | "minmax" | "min-max" => Ok(Self::MinMax),
            "none" => Ok(Self::None),
            other => Err(PrepError::config(format!(
                "unknown scaling policy '{other}' (expected standard, min_max or none)"
            ))),
        }
    }
}

/// Location and scale of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParam {
    pub location: f64,
    pub scale: f64,
}

/// Per-feature scaler. Unfitted until [`FeatureScaler::fit`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    policy: ScalingPolicy,
    #[serde(default)]
    feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Vec<ScaleParam>>,
}

impl FeatureScaler {
    pub fn new(policy: ScalingPolicy) -> Self {
        Self {
            policy,
            feature_names: Vec::new(),
            params: None,
        }
    }

    pub fn policy(&self) -> ScalingPolicy {
        self.policy
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn params(&self) -> Option<&[ScaleParam]> {
        self.params.as_deref()
    }

    /// Compute parameters from `train`. Refitting replaces earlier parameters.
    pub fn fit(&mut self, train: &FeatureMatrix) -> Result<()> {
        if train.row_count() == 0 {
            return Err(PrepError::empty_dataset("cannot fit scaler on zero rows"));
        }
        let params = (0..train.column_count())
            .map(|idx| fit_column(self.policy, train.column(idx)))
            .collect::<Vec<_>>();
        if let Some((name, _)) = train
            .columns
            .iter()
            .zip(&params)
            .find(|(_, p)| !p.location.is_finite() || !p.scale.is_finite())
        {
            return Err(PrepError::format(format!(
                "feature '{name}' overflows while fitting the scaler"
            )));
        }

        tracing::debug!(
            policy = ?self.policy,
            features = params.len(),
            rows = train.row_count(),
            "Fitted feature scaler"
        );

        self.feature_names = train.columns.clone();
        self.params = Some(params);
        Ok(())
    }

    /// Apply the fitted parameters; never updates them.
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| PrepError::not_fitted("feature scaler must be fitted before transform"))?;
        if matrix.column_count() != params.len() {
            return Err(PrepError::format(format!(
                "scaler was fitted on {} features, got {}",
                params.len(),
                matrix.column_count()
            )));
        }
        let rows = matrix
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(params)
                    .map(|(x, p)| (x - p.location) / p.scale)
                    .collect::<Vec<f64>>()
            })
            .collect();
        Ok(FeatureMatrix::new(matrix.columns.clone(), rows))
    }

    /// Map scaled values back to the original units.
    pub fn inverse_transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| {
                PrepError::not_fitted("feature scaler must be fitted before inverse_transform")
            })?;
        if matrix.column_count() != params.len() {
            return Err(PrepError::format(format!(
                "scaler was fitted on {} features, got {}",
                params.len(),
                matrix.column_count()
            )));
        }
        let rows = matrix
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(params)
                    .map(|(x, p)| x * p.scale + p.location)
                    .collect::<Vec<f64>>()
            })
            .collect();
        Ok(FeatureMatrix::new(matrix.columns.clone(), rows))
    }

    /// Rebuild a fitted scaler, e.g. from a persisted artifact.
    pub fn from_params(
        policy: ScalingPolicy,
        feature_names: Vec<String>,
        params: Vec<ScaleParam>,
    ) -> Result<Self> {
        if feature_names.len() != params.len() {
            return Err(PrepError::format(format!(
                "scaler has {} feature names but {} parameter pairs",
                feature_names.len(),
                params.len()
            )));
        }
        let invalid = params
            .iter()
            .any(|p| !p.location.is_finite() || !p.scale.is_finite() || p.scale < MIN_SCALE);
        if invalid {
            return Err(PrepError::format(
                "scaler parameters must be finite with positive scale",
            ));
        }
        Ok(Self {
            policy,
            feature_names,
            params: Some(params),
        })
    }
}

fn fit_column(policy: ScalingPolicy, values: impl Iterator<Item = f64> + Clone) -> ScaleParam {
    let (location, spread) = match policy {
        ScalingPolicy::None => return ScaleParam { location: 0.0, scale: 1.0 },
        ScalingPolicy::Standard => {
            let n = values.clone().count() as f64;
            let mean = values.clone().sum::<f64>() / n;
            let variance = values.map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        }
        ScalingPolicy::MinMax => {
            let min = values.clone().fold(f64::INFINITY, f64::min);
            let max = values.fold(f64::NEG_INFINITY, f64::max);
            (min, max - min)
        }
    };
    let scale = if spread < MIN_SCALE { 1.0 } else { spread };
    ScaleParam { location, scale }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let cols = rows.first().map_or(0, Vec::len);
        FeatureMatrix::new((0..cols).map(|i| format!("f{i}")).collect(), rows)
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = FeatureScaler::new(ScalingPolicy::Standard);
        let err = scaler.transform(&matrix(vec![vec![1.0]])).unwrap_err();
        assert!(matches!(err, PrepError::NotFitted(_)));
    }

    #[test]
    fn test_standard_gives_zero_mean_unit_variance() {
        let train = matrix(vec![
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 40.0],
            vec![6.0, 80.0],
        ]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&train).unwrap();
        let scaled = scaler.transform(&train).unwrap();
        for idx in 0..2 {
            let n = scaled.row_count() as f64;
            let mean = scaled.column(idx).sum::<f64>() / n;
            let var = scaled.column(idx).map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "mean {mean}");
            assert!((var - 1.0).abs() < 1e-9, "variance {var}");
        }
    }

    #[test]
    fn test_constant_feature_is_centred_not_divided() {
        let train = matrix(vec![vec![5.0], vec![5.0], vec![5.0]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&train).unwrap();
        assert_eq!(scaler.params().unwrap()[0], ScaleParam { location: 5.0, scale: 1.0 });
        let out = scaler.transform(&matrix(vec![vec![7.0]])).unwrap();
        assert_eq!(out.rows[0][0], 2.0);
    }

    #[test]
    fn test_min_max() {
        let train = matrix(vec![vec![2.0], vec![4.0], vec![6.0]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::MinMax);
        scaler.fit(&train).unwrap();
        let out = scaler.transform(&train).unwrap();
        assert_eq!(out.rows, vec![vec![0.0], vec![0.5], vec![1.0]]);
    }

    #[test]
    fn test_none_is_identity() {
        let train = matrix(vec![vec![2.0], vec![4.0]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::None);
        scaler.fit(&train).unwrap();
        assert_eq!(scaler.transform(&train).unwrap(), train);
    }

    #[test]
    fn test_transform_does_not_refit() {
        let train = matrix(vec![vec![0.0], vec![2.0]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&train).unwrap();
        let before = scaler.clone();
        let _ = scaler.transform(&matrix(vec![vec![100.0], vec![-50.0]])).unwrap();
        assert_eq!(scaler, before);
    }

    #[test]
    fn test_inverse_transform() {
        let train = matrix(vec![vec![1.0], vec![3.0]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&train).unwrap();
        let back = scaler
            .inverse_transform(&scaler.transform(&train).unwrap())
            .unwrap();
        assert!((back.rows[1][0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch_is_format_error() {
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&matrix(vec![vec![1.0, 2.0]])).unwrap();
        let err = scaler.transform(&matrix(vec![vec![1.0]])).unwrap_err();
        assert!(matches!(err, PrepError::Format(_)));
    }

    #[test]
    fn test_fit_on_empty() {
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        let err = scaler.fit(&FeatureMatrix::empty(vec!["a".into()])).unwrap_err();
        assert!(matches!(err, PrepError::EmptyDataset(_)));
    }

    #[test]
    fn test_fit_rejects_overflowing_feature() {
        let huge = matrix(vec![vec![1.0, 1e200], vec![2.0, -1e200]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        let err = scaler.fit(&huge).unwrap_err();
        assert!(matches!(err, PrepError::Format(ref msg) if msg.contains("f1")));
        assert!(!scaler.is_fitted());

        let wide = matrix(vec![vec![f64::MAX], vec![-f64::MAX]]);
        let mut scaler = FeatureScaler::new(ScalingPolicy::MinMax);
        assert!(matches!(scaler.fit(&wide), Err(PrepError::Format(_))));

        let mut scaler = FeatureScaler::new(ScalingPolicy::None);
        assert!(scaler.fit(&wide).is_ok());
    }
}
