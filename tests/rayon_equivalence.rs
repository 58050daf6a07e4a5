#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ssdpost::{
    detect, predict, DetectConfig, ImageShape, PredictConfig, PredictionView, PriorBox, PriorBoxes,
};

const NUM_CLASSES: usize = 21;
const ROW_LEN: usize = 4 + NUM_CLASSES;

fn make_inputs(num_priors: usize, seed: u64) -> (PriorBoxes, Vec<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let priors: PriorBoxes = (0..num_priors)
        .map(|_| {
            PriorBox::new(
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
                rng.random_range(0.05..0.5),
                rng.random_range(0.05..0.5),
            )
        })
        .collect();

    let mut raw = Vec::with_capacity(num_priors * ROW_LEN);
    for _ in 0..num_priors {
        for _ in 0..4 {
            raw.push(rng.random_range(-1.0..1.0));
        }
        let mut scores: Vec<f32> = (0..NUM_CLASSES).map(|_| rng.random_range(0.0..1.0)).collect();
        let total: f32 = scores.iter().sum();
        for score in &mut scores {
            *score /= total;
        }
        raw.extend_from_slice(&scores);
    }
    (priors, raw)
}

#[test]
fn parallel_detect_matches_sequential() {
    let (priors, raw) = make_inputs(2000, 17);
    let view = PredictionView::from_slice(&raw, ROW_LEN).unwrap();

    let seq_cfg = DetectConfig {
        parallel: false,
        ..DetectConfig::default()
    };
    let par_cfg = DetectConfig {
        parallel: true,
        ..DetectConfig::default()
    };
    let seq = detect(view, &priors, &seq_cfg).unwrap().unwrap();
    let par = detect(view, &priors, &par_cfg).unwrap().unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_predict_matches_sequential() {
    let (priors, raw) = make_inputs(2000, 23);
    let view = PredictionView::from_slice(&raw, ROW_LEN).unwrap();
    let base = PredictConfig {
        class_threshold: 0.06,
        ..PredictConfig::default()
    };

    let seq_cfg = PredictConfig {
        parallel: false,
        ..base.clone()
    };
    let par_cfg = PredictConfig {
        parallel: true,
        ..base
    };
    let shape = ImageShape::new(375, 500);
    let seq = predict(view, &priors, shape, &seq_cfg).unwrap();
    let par = predict(view, &priors, shape, &par_cfg).unwrap();
    assert_eq!(seq, par);
}
