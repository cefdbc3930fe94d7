//! Splitter stage: seeded train/validation/test partitioning.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Allowed deviation of the percentage sum from 100.
const PERCENT_TOLERANCE: f64 = 1e-6;

/// Partition sizes as percentages of the cleaned row count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPercentages {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitPercentages {
    fn default() -> Self {
        Self {
            train: 70.0,
            validation: 15.0,
            test: 15.0,
        }
    }
}

impl SplitPercentages {
    pub fn new(train: f64, validation: f64, test: f64) -> Self {
        Self {
            train,
            validation,
            test,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, pct) in [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ] {
            if !pct.is_finite() || pct < 0.0 {
                return Err(PrepError::invalid_split(format!(
                    "{name} percentage must be a non-negative number, got {pct}"
                )));
            }
        }
        let sum = self.train + self.validation + self.test;
        if (sum - 100.0).abs() > PERCENT_TOLERANCE {
            return Err(PrepError::invalid_split(format!(
                "percentages must sum to 100, got {sum}"
            )));
        }
        Ok(())
    }

    /// Row counts for `n` rows: validation and test are rounded to the
    /// nearest row, the remainder goes to train.
    pub fn sizes(&self, n: usize) -> (usize, usize, usize) {
        let validation = (n as f64 * self.validation / 100.0).round() as usize;
        let test = (n as f64 * self.test / 100.0).round() as usize;
        let train = n.saturating_sub(validation + test);
        (train, validation, test)
    }
}

impl std::str::FromStr for SplitPercentages {
    type Err = PrepError;

    /// Parse `"70,15,15"` or `"70/15/15"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split([',', '/'])
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|_| PrepError::invalid_split(format!("'{p}' is not a number")))
            })
            .collect::<Result<Vec<_>>>()?;
        match parts.as_slice() {
            [train, validation, test] => Ok(Self::new(*train, *validation, *test)),
            _ => Err(PrepError::invalid_split(format!(
                "expected three percentages (train,validation,test), got '{s}'"
            ))),
        }
    }
}

/// Disjoint row-index sets covering `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// Assign `n` rows to partitions.
///
/// The indices are shuffled with a `StdRng` seeded from `seed`, then cut into
/// consecutive train/validation/test slices, so the same seed and row count
/// always give the same split.
pub fn split_indices(n: usize, percentages: SplitPercentages, seed: u64) -> Result<Split> {
    percentages.validate()?;

    let (train_len, validation_len, test_len) = percentages.sizes(n);
    if train_len == 0 || validation_len == 0 || test_len == 0 {
        return Err(PrepError::invalid_split(format!(
            "{n} rows give an empty partition \
             (train {train_len}, validation {validation_len}, test {test_len})"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(train_len + validation_len);
    let validation = indices.split_off(train_len);
    let train = indices;

    tracing::debug!(
        seed,
        train = train.len(),
        validation = validation.len(),
        test = test.len(),
        "Split rows"
    );

    Ok(Split {
        train,
        validation,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sizes_assign_remainder_to_train() {
        let pct = SplitPercentages::default();
        assert_eq!(pct.sizes(995), (697, 149, 149));
        assert_eq!(pct.sizes(100), (70, 15, 15));
        assert_eq!(pct.sizes(10), (6, 2, 2));
        assert_eq!(pct.sizes(20), (14, 3, 3));
    }

    #[test]
    fn test_split_is_partition() {
        let split = split_indices(995, SplitPercentages::default(), 42).unwrap();
        assert_eq!(split.total(), 995);
        let all: HashSet<usize> = split
            .train
            .iter()
            .chain(&split.validation)
            .chain(&split.test)
            .copied()
            .collect();
        assert_eq!(all.len(), 995);
        assert!(all.iter().all(|&i| i < 995));
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_indices(200, SplitPercentages::default(), 42).unwrap();
        let b = split_indices(200, SplitPercentages::default(), 42).unwrap();
        let c = split_indices(200, SplitPercentages::default(), 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_bad_sum_rejected() {
        let err = split_indices(100, SplitPercentages::new(70.0, 20.0, 20.0), 1).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSplit(_)));
    }

    #[test]
    fn test_negative_rejected() {
        let pct = SplitPercentages::new(110.0, -5.0, -5.0);
        assert!(matches!(pct.validate(), Err(PrepError::InvalidSplit(_))));
    }

    #[test]
    fn test_empty_partition_rejected() {
        let err = split_indices(3, SplitPercentages::default(), 1).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSplit(_)));
        let err = split_indices(100, SplitPercentages::new(100.0, 0.0, 0.0), 1).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSplit(_)));
    }

    #[test]
    fn test_parse_percentages() {
        let pct: SplitPercentages = "80,10,10".parse().unwrap();
        assert_eq!(pct, SplitPercentages::new(80.0, 10.0, 10.0));
        let pct: SplitPercentages = "60/20/20".parse().unwrap();
        assert_eq!(pct.validation, 20.0);
        assert!("70,30".parse::<SplitPercentages>().is_err());
        assert!("a,b,c".parse::<SplitPercentages>().is_err());
    }
}
