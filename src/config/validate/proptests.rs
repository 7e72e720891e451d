//! Property tests for configuration validation

use super::validator::validate_spec;
use crate::config::schema::TrainSpec;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_ranges_accepted(
        lr in 1e-6f32..1.0,
        momentum in 0.0f32..0.999,
        weight_decay in 0.0f32..0.1,
        smoothing in 0.0f32..0.999,
        max_epoch in 1usize..1000,
    ) {
        let mut spec = TrainSpec::default();
        spec.optimizer.learning_rate = lr;
        spec.optimizer.momentum = momentum;
        spec.optimizer.weight_decay = weight_decay;
        spec.validation.smoothing = smoothing;
        spec.training.max_epoch = max_epoch;
        prop_assert!(validate_spec(&spec).is_ok());
    }

    #[test]
    fn prop_learning_rate_out_of_range_rejected(lr in prop_oneof![-10.0f32..=0.0, 1.0001f32..10.0]) {
        let mut spec = TrainSpec::default();
        spec.optimizer.learning_rate = lr;
        prop_assert!(validate_spec(&spec).is_err());
    }

    #[test]
    fn prop_smoothing_out_of_range_rejected(s in prop_oneof![-5.0f32..-0.0001, 1.0f32..5.0]) {
        let mut spec = TrainSpec::default();
        spec.validation.smoothing = s;
        prop_assert!(validate_spec(&spec).is_err());
    }
}
