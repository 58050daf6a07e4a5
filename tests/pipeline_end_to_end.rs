use ssdpost::{
    decode, denormalize, detect, filter_boxes, predict, BoxTable, DetectConfig, ImageShape,
    PredictConfig, PredictionView, PriorBox, PriorBoxes, ScaleFactors, SsdPostError,
};

/// Horizontal shift that gives two 0.2x0.2 boxes an IoU of 0.9.
const SHIFT_FOR_IOU_09: f32 = 0.02 / 1.9;

fn overlapping_pair() -> (PriorBoxes, Vec<f32>) {
    let priors = PriorBoxes::new(vec![
        PriorBox::new(0.5, 0.5, 0.2, 0.2),
        PriorBox::new(0.5 + SHIFT_FOR_IOU_09, 0.5, 0.2, 0.2),
    ]);
    let raw = vec![
        0.0, 0.0, 0.0, 0.0, 0.2, 0.9, // prior A
        0.0, 0.0, 0.0, 0.0, 0.3, 0.95, // prior B
    ];
    (priors, raw)
}

#[test]
fn scenario_priors_overlap_as_intended() {
    let (priors, _) = overlapping_pair();
    let a = priors.get(0).unwrap().corners();
    let b = priors.get(1).unwrap().corners();
    assert!((a.iou(&b) - 0.9).abs() < 1e-4);
}

#[test]
fn predict_keeps_higher_scoring_of_overlapping_pair() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw, 6).unwrap();

    let decoded = decode(view, &priors, ScaleFactors::default()).unwrap();
    let filtered = filter_boxes(&decoded, 2, 0, 0.5).unwrap().unwrap();
    assert_eq!(filtered.len(), 2);

    let cfg = PredictConfig {
        num_classes: 2,
        class_threshold: 0.5,
        iou_threshold: 0.45,
        ..PredictConfig::default()
    };
    let shape = ImageShape::new(300, 300);
    let result = predict(view, &priors, shape, &cfg).unwrap().unwrap();
    assert_eq!(result.len(), 1);

    let det = result.detections().next().unwrap();
    assert_eq!(det.class_id, 1);
    assert!((det.score - 0.95).abs() < 1e-6);
    let expected = priors.get(1).unwrap().corners().scale(300.0, 300.0);
    assert!((det.corners.x_min - expected.x_min).abs() < 1e-3);
    assert!((det.corners.x_max - expected.x_max).abs() < 1e-3);
}

#[test]
fn detect_keeps_higher_scoring_of_overlapping_pair() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw, 6).unwrap();
    let result = detect(view, &priors, &DetectConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.scores(0).unwrap(), &[0.3f32, 0.95]);
    // detect stays normalized
    let corners = result.corners(0).unwrap();
    assert!(corners.x_max <= 1.0);
}

#[test]
fn all_background_yields_no_detections() {
    let priors = PriorBoxes::new(vec![PriorBox::new(0.5, 0.5, 0.2, 0.2); 3]);
    let raw = vec![
        0.0, 0.0, 0.0, 0.0, 0.9, 0.05, 0.05, //
        0.1, 0.0, 0.0, 0.0, 0.8, 0.1, 0.1, //
        0.0, 0.2, 0.0, 0.0, 0.6, 0.3, 0.1, //
    ];
    let view = PredictionView::from_slice(&raw, 7).unwrap();

    let cfg = PredictConfig {
        num_classes: 3,
        ..PredictConfig::default()
    };
    assert!(predict(view, &priors, ImageShape::new(10, 10), &cfg)
        .unwrap()
        .is_none());
    assert!(detect(view, &priors, &DetectConfig::default())
        .unwrap()
        .is_none());
}

#[test]
fn threshold_above_one_yields_no_detections() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw, 6).unwrap();
    let decoded = decode(view, &priors, ScaleFactors::default()).unwrap();
    assert!(filter_boxes(&decoded, 2, 0, 1.01).unwrap().is_none());

    let cfg = DetectConfig {
        confidence_threshold: 1.01,
        ..DetectConfig::default()
    };
    assert!(detect(view, &priors, &cfg).unwrap().is_none());
}

#[test]
fn classes_are_suppressed_independently() {
    // Two identical boxes labelled with different classes both survive.
    let priors = PriorBoxes::new(vec![PriorBox::new(0.5, 0.5, 0.4, 0.4); 2]);
    let raw = vec![
        0.0, 0.0, 0.0, 0.0, 0.1, 0.8, 0.1, //
        0.0, 0.0, 0.0, 0.0, 0.1, 0.1, 0.8, //
    ];
    let view = PredictionView::from_slice(&raw, 7).unwrap();
    let result = detect(view, &priors, &DetectConfig::default())
        .unwrap()
        .unwrap();
    let classes: Vec<usize> = result.detections().map(|d| d.class_id).collect();
    assert_eq!(classes, vec![1, 2]);
}

#[test]
fn output_is_grouped_by_class_and_sorted_by_score() {
    let priors = PriorBoxes::new(vec![
        PriorBox::new(0.1, 0.1, 0.1, 0.1),
        PriorBox::new(0.9, 0.9, 0.1, 0.1),
        PriorBox::new(0.5, 0.5, 0.1, 0.1),
        PriorBox::new(0.3, 0.7, 0.1, 0.1),
    ]);
    let raw = vec![
        0.0, 0.0, 0.0, 0.0, 0.1, 0.0, 0.6, //
        0.0, 0.0, 0.0, 0.0, 0.1, 0.5, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.1, 0.0, 0.9, //
        0.0, 0.0, 0.0, 0.0, 0.1, 0.7, 0.0, //
    ];
    let view = PredictionView::from_slice(&raw, 7).unwrap();
    let result = detect(view, &priors, &DetectConfig::default())
        .unwrap()
        .unwrap();
    let summary: Vec<(usize, f32)> = result.detections().map(|d| (d.class_id, d.score)).collect();
    assert_eq!(summary, vec![(1, 0.7), (1, 0.5), (2, 0.9), (2, 0.6)]);
}

#[test]
fn zero_regression_with_unit_scale_reproduces_priors() {
    let priors = PriorBoxes::new(vec![
        PriorBox::new(0.3, 0.4, 0.2, 0.1),
        PriorBox::new(0.7, 0.2, 0.05, 0.3),
    ]);
    let raw = vec![0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5];
    let view = PredictionView::from_slice(&raw, 6).unwrap();
    let decoded = decode(view, &priors, ScaleFactors::UNIT).unwrap();
    for (idx, prior) in priors.iter().enumerate() {
        assert_eq!(decoded.corners(idx).unwrap(), prior.corners());
    }
}

#[test]
fn denormalize_scenario_matches_pixels() {
    let boxes = BoxTable::from_vec(vec![0.1, 0.2, 0.5, 0.6, 0.0, 1.0], 6).unwrap();
    let pixels = denormalize(&boxes, ImageShape::from((200, 100)));
    let expected = [10.0f32, 40.0, 50.0, 120.0];
    for (value, expected) in pixels.row(0).unwrap()[..4].iter().zip(expected) {
        assert!((value - expected).abs() < 1e-4, "{value} != {expected}");
    }
}

#[test]
fn mismatched_prior_count_is_fatal() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw[..6], 6).unwrap();
    let err = detect(view, &priors, &DetectConfig::default()).unwrap_err();
    assert_eq!(
        err,
        SsdPostError::ShapeMismatch {
            priors: 2,
            predictions: 1,
        }
    );
}

#[test]
fn predict_rejects_wrong_class_count() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw, 6).unwrap();
    let err = predict(
        view,
        &priors,
        ImageShape::new(300, 300),
        &PredictConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SsdPostError::ClassCountMismatch {
            expected: 21,
            got: 2,
        }
    );
}

#[test]
fn predict_rejects_zero_sized_image() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw, 6).unwrap();
    let cfg = PredictConfig {
        num_classes: 2,
        ..PredictConfig::default()
    };
    let err = predict(view, &priors, ImageShape::new(0, 0), &cfg).unwrap_err();
    assert_eq!(
        err,
        SsdPostError::InvalidDimensions {
            width: 0,
            height: 0,
        }
    );
}

#[test]
fn iou_threshold_above_one_is_rejected() {
    let (priors, raw) = overlapping_pair();
    let view = PredictionView::from_slice(&raw, 6).unwrap();
    let cfg = DetectConfig {
        iou_threshold: 1.5,
        ..DetectConfig::default()
    };
    assert!(matches!(
        detect(view, &priors, &cfg),
        Err(SsdPostError::InvalidConfig(_))
    ));
}
