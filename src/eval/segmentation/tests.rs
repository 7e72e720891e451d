//! Tests for segmentation metrics

#[cfg(test)]
mod tests {
    use crate::eval::segmentation::{
        is_new_best, BestScore, BinaryConfusion, ConfusionMatrix, ConfusionMode,
        SegmentationMetrics,
    };
    use crate::labels::ClassLabelSpace;
    use approx::assert_abs_diff_eq;

    fn binary_space() -> ClassLabelSpace {
        ClassLabelSpace::new(vec![0, 1], vec![]).unwrap()
    }

    #[test]
    fn test_binary_scenario() {
        let truth = [0, 0, 1, 1];
        let pred = [0, 1, 1, 1];
        let m = SegmentationMetrics::global(&truth, &pred, &binary_space()).unwrap();

        let b = m.binary.unwrap();
        assert_eq!((b.tn, b.fp, b.fn_, b.tp), (1.0, 1.0, 0.0, 2.0));
        assert_abs_diff_eq!(m.accuracy, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(m.f1, 0.8, epsilon = 1e-12);
        // IoU(0) = 1/2, IoU(1) = 2/3
        assert_abs_diff_eq!(m.mean_iou, (0.5 + 2.0 / 3.0) / 2.0, epsilon = 1e-12);

        let rates = m.rates().unwrap();
        assert_abs_diff_eq!(rates.tpr, 1.0);
        assert_abs_diff_eq!(rates.fpr, 0.5);
        assert_abs_diff_eq!(rates.fnr, 0.0);
        assert_abs_diff_eq!(rates.tnr, 0.5);
    }

    #[test]
    fn test_from_labels_uses_sorted_union() {
        let cm = ConfusionMatrix::from_labels(&[5, 2, 2], &[2, 9, 2]).unwrap();
        assert_eq!(cm.labels(), &[2, 5, 9]);
        assert_eq!(cm.get(0, 0), 1.0);
        assert_eq!(cm.get(0, 2), 1.0);
        assert_eq!(cm.get(1, 0), 1.0);
        assert_abs_diff_eq!(cm.accuracy(), cm.matrix().diag().sum() / cm.total());
    }

    #[test]
    fn test_length_mismatch_is_error() {
        assert!(ConfusionMatrix::from_labels(&[0, 1], &[0]).is_err());
    }

    #[test]
    fn test_ignored_removed_before_scores() {
        let space = ClassLabelSpace::new(vec![0, 1, 2], vec![0]).unwrap();
        let truth = [0, 1, 2, 2];
        let pred = [1, 1, 2, 0];
        let m = SegmentationMetrics::global(&truth, &pred, &space).unwrap();

        assert_eq!(m.confusion.n_classes(), space.num_classes() - space.ignored().len());
        assert_eq!(m.confusion.labels(), &[1, 2]);
        // Accuracy counts raw matches over every point
        assert_abs_diff_eq!(m.accuracy, 0.5);
        // After removal: true 1 -> 1, true 2 -> 2; the (2, 0) point is gone
        assert_abs_diff_eq!(m.mean_iou, 1.0);
    }

    #[test]
    fn test_remove_unknown_label_is_noop() {
        let mut cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1]).unwrap();
        let before = cm.clone();
        cm.remove_label(7);
        assert_eq!(cm, before);
    }

    #[test]
    fn test_rebalance_rows() {
        let mut cm = ConfusionMatrix::with_labels(
            &[0, 0, 0, 0, 1, 1, 1, 1],
            &[0, 0, 1, 1, 0, 1, 1, 1],
            &[0, 1],
        )
        .unwrap();
        cm.rebalance(&[10.0, 20.0]).unwrap();
        assert_abs_diff_eq!(cm.get(0, 0), 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.get(0, 1), 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.get(1, 0), 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.get(1, 1), 15.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rebalance_empty_row_stays_zero() {
        let mut cm = ConfusionMatrix::with_labels(&[0], &[0], &[0, 1]).unwrap();
        cm.rebalance(&[3.0, 4.0]).unwrap();
        assert_eq!(cm.get(1, 0), 0.0);
        assert_eq!(cm.get(1, 1), 0.0);
        assert!(cm.rebalance(&[1.0]).is_err());
    }

    #[test]
    fn test_balanced_mode_sums_parts() {
        let space = ClassLabelSpace::new(vec![0, 1, 2], vec![0]).unwrap();
        let parts = vec![(vec![1, 1, 2], vec![1, 2, 2]), (vec![2, 0], vec![2, 2])];
        let m =
            SegmentationMetrics::evaluate(ConfusionMode::Balanced, &parts, &space, &[2.0, 6.0])
                .unwrap();
        // Model classes [1, 2]; row 1 = [1, 1] -> [1, 1]; row 2 = [0, 2] -> [0, 6]
        assert_abs_diff_eq!(m.confusion.get(0, 0), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.confusion.get(0, 1), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.confusion.get(1, 1), 6.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.accuracy, 3.0 / 5.0);
        assert!(
            SegmentationMetrics::evaluate(ConfusionMode::Balanced, &parts, &space, &[1.0]).is_err()
        );
    }

    #[test]
    fn test_global_mode_stacks_parts() {
        let parts = vec![(vec![0, 0], vec![0, 1]), (vec![1, 1], vec![1, 1])];
        let m = SegmentationMetrics::evaluate(ConfusionMode::Global, &parts, &binary_space(), &[])
            .unwrap();
        assert_abs_diff_eq!(m.f1, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_input_reports_zero() {
        let m = SegmentationMetrics::global(&[], &[], &binary_space()).unwrap();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.mean_iou, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.rates().unwrap().tpr, 0.0);
    }

    #[test]
    fn test_single_observed_class() {
        let m = SegmentationMetrics::global(&[1, 1], &[1, 1], &binary_space()).unwrap();
        assert_abs_diff_eq!(m.mean_iou, 1.0);
        assert_abs_diff_eq!(m.f1, 1.0);
        let rates = m.rates().unwrap();
        assert_eq!(rates.fpr, 0.0);
        assert_eq!(rates.tnr, 0.0);
    }

    #[test]
    fn test_multiclass_uses_macro_f1() {
        let space = ClassLabelSpace::new(vec![0, 1, 2], vec![]).unwrap();
        let m = SegmentationMetrics::global(&[0, 1, 2], &[0, 1, 1], &space).unwrap();
        assert!(m.binary.is_none());
        // F1: class 0 = 1, class 1 = 2/3, class 2 = 0
        assert_abs_diff_eq!(m.f1, (1.0 + 2.0 / 3.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_binary_requires_two_classes() {
        let cm = ConfusionMatrix::from_labels(&[0, 1, 2], &[0, 1, 2]).unwrap();
        assert!(BinaryConfusion::from_matrix(&cm).is_none());
    }

    #[test]
    fn test_is_new_best_is_strict() {
        assert_eq!(is_new_best(0.5, 0.4), (0.5, true));
        assert_eq!(is_new_best(0.5, 0.5), (0.5, false));
        assert_eq!(is_new_best(0.3, 0.5), (0.5, false));
        assert_eq!(is_new_best(f64::NAN, 0.5), (0.5, false));

        let mut best = BestScore::default();
        assert!(!best.update(0.0));
        assert!(best.update(0.2));
        assert!(!best.update(0.2));
        assert_eq!(best.value(), 0.2);
    }

    #[test]
    fn test_add_requires_same_labels() {
        let mut a = ConfusionMatrix::new(vec![0, 1]);
        let b = ConfusionMatrix::new(vec![0, 2]);
        assert!(a.add(&b).is_err());
        let c = ConfusionMatrix::with_labels(&[0], &[1], &[0, 1]).unwrap();
        a.add(&c).unwrap();
        a.add(&c).unwrap();
        assert_eq!(a.get(0, 1), 2.0);
    }

    #[test]
    fn test_display() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1]).unwrap();
        let s = cm.to_string();
        assert!(s.contains("Confusion Matrix"));
        assert!(s.contains("True 1"));
    }
}

#[cfg(test)]
mod proptests {
    use crate::eval::segmentation::ConfusionMatrix;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn label_pairs() -> impl Strategy<Value = (Vec<i32>, Vec<i32>)> {
        (1usize..64).prop_flat_map(|n| {
            (prop::collection::vec(0i32..4, n), prop::collection::vec(0i32..4, n))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_accuracy_is_trace_over_total((truth, pred) in label_pairs()) {
            let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
            let matches = truth.iter().zip(&pred).filter(|(t, p)| t == p).count();
            prop_assert!((cm.accuracy() - matches as f64 / truth.len() as f64).abs() < 1e-12);
            prop_assert_eq!(cm.total(), truth.len() as f64);
        }

        #[test]
        fn prop_scores_bounded((truth, pred) in label_pairs()) {
            let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
            let miou = cm.mean_iou();
            prop_assert!((0.0..=1.0).contains(&miou));
            prop_assert!((0.0..=1.0).contains(&cm.macro_f1()));
        }

        #[test]
        fn prop_removal_shrinks_dimension((truth, pred) in label_pairs(), drop in 0i32..4) {
            let mut cm = ConfusionMatrix::with_labels(&truth, &pred, &[0, 1, 2, 3]).unwrap();
            cm.remove_label(drop);
            prop_assert_eq!(cm.n_classes(), 3);
            prop_assert!(!cm.labels().contains(&drop));
        }

        #[test]
        fn prop_rebalanced_rows_match_proportions(
            (truth, pred) in label_pairs(),
            props in prop::collection::vec(1.0f64..100.0, 4),
        ) {
            let mut cm = ConfusionMatrix::with_labels(&truth, &pred, &[0, 1, 2, 3]).unwrap();
            let sums: Vec<f64> = (0..4).map(|c| cm.support(c)).collect();
            cm.rebalance(&props).unwrap();
            for c in 0..4 {
                if sums[c] > 0.0 {
                    assert_abs_diff_eq!(cm.support(c), props[c], epsilon = 1e-3);
                }
            }
        }
    }
}
