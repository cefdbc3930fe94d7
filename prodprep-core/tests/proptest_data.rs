//! Property-based tests for the data stages using proptest.

use proptest::prelude::*;
use std::collections::BTreeSet;

use prodprep_core::data::split::{SplitPercentages, split_indices};
use prodprep_core::{FeatureMatrix, FeatureScaler, LabelEncoding, ScalingPolicy};

// --- Split properties ---

proptest! {
    #[test]
    fn split_is_a_partition(n in 10usize..2000, seed in any::<u64>()) {
        let split = split_indices(n, SplitPercentages::default(), seed).unwrap();
        prop_assert_eq!(split.total(), n);

        let mut seen = BTreeSet::new();
        for idx in split.train.iter().chain(&split.validation).chain(&split.test) {
            prop_assert!(*idx < n);
            prop_assert!(seen.insert(*idx), "index {} assigned twice", idx);
        }
        prop_assert_eq!(seen.len(), n);
    }

    #[test]
    fn split_sizes_stay_within_one_row_of_share(
        n in 40usize..5000,
        val in 5u32..40,
        test in 5u32..40,
    ) {
        let train = 100 - val - test;
        let pct = SplitPercentages::new(f64::from(train), f64::from(val), f64::from(test));
        let split = split_indices(n, pct, 1).unwrap();
        prop_assert_eq!(split.total(), n);
        for (len, share) in [
            (split.train.len(), train),
            (split.validation.len(), val),
            (split.test.len(), test),
        ] {
            let exact = n as f64 * f64::from(share) / 100.0;
            prop_assert!(
                (len as f64 - exact).abs() <= 1.0,
                "{} rows for a {}% share of {}",
                len,
                share,
                n
            );
        }
    }

    #[test]
    fn split_is_deterministic(n in 10usize..1000, seed in any::<u64>()) {
        let a = split_indices(n, SplitPercentages::default(), seed).unwrap();
        let b = split_indices(n, SplitPercentages::default(), seed).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn split_rejects_bad_sums(train in 0.0f64..100.0, validation in 0.0f64..100.0) {
        let test = 10.0;
        prop_assume!((train + validation + test - 100.0).abs() > 1e-3);
        let pct = SplitPercentages::new(train, validation, test);
        prop_assert!(split_indices(100, pct, 0).is_err());
    }
}

// --- Label encoding properties ---

proptest! {
    #[test]
    fn label_codes_ignore_row_order(
        labels in prop::collection::vec("[a-e]{1,3}", 1..60),
        rotate in 0usize..60,
    ) {
        let mut permuted = labels.clone();
        let k = rotate % permuted.len();
        permuted.rotate_left(k);
        permuted.reverse();

        let a = LabelEncoding::fit("label", labels.iter().map(String::as_str)).unwrap();
        let b = LabelEncoding::fit("label", permuted.iter().map(String::as_str)).unwrap();
        prop_assert_eq!(a.classes(), b.classes());
        for label in &labels {
            let code = a.encode(label).unwrap();
            prop_assert!(code < a.num_classes());
            prop_assert_eq!(a.decode(code).unwrap(), label.as_str());
        }
    }
}

// --- Scaler properties ---

fn matrix(values: &[f64]) -> FeatureMatrix {
    FeatureMatrix::new(
        vec!["x".to_string()],
        values.iter().map(|v| vec![*v]).collect(),
    )
}

proptest! {
    #[test]
    fn standard_scaling_centers_train(values in prop::collection::vec(-1e6f64..1e6, 2..100)) {
        let train = matrix(&values);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&train).unwrap();
        let scaled = scaler.transform(&train).unwrap();
        let mean = scaled.column(0).sum::<f64>() / values.len() as f64;
        prop_assert!(mean.abs() < 1e-6, "mean {}", mean);
        prop_assert!(scaled.rows.iter().all(|r| r[0].is_finite()));
    }

    #[test]
    fn transform_does_not_change_fitted_params(
        train in prop::collection::vec(-1e3f64..1e3, 2..50),
        other in prop::collection::vec(-1e5f64..1e5, 1..50),
    ) {
        let mut scaler = FeatureScaler::new(ScalingPolicy::MinMax);
        scaler.fit(&matrix(&train)).unwrap();
        let before = scaler.clone();
        scaler.transform(&matrix(&other)).unwrap();
        prop_assert_eq!(scaler, before);
    }

    #[test]
    fn inverse_transform_restores_values(values in prop::collection::vec(-1e3f64..1e3, 2..50)) {
        let train = matrix(&values);
        let mut scaler = FeatureScaler::new(ScalingPolicy::Standard);
        scaler.fit(&train).unwrap();
        let restored = scaler
            .inverse_transform(&scaler.transform(&train).unwrap())
            .unwrap();
        for (a, b) in restored.column(0).zip(train.column(0)) {
            prop_assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
        }
    }
}
