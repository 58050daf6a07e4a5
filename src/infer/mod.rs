//! End-to-end inference wrappers around an injected predictor.
//!
//! These functions run preprocessing, the predictor, the [`crate::detect`]
//! path and denormalization. Unlike the lower-level APIs they never return
//! "no detections" as `None`: an empty result becomes a single all-zero row
//! of `output_width` columns so downstream consumers see a uniform shape
//! (see [`BoxTable::is_empty_sentinel`]).

#[cfg(feature = "image-io")]
pub mod io;
pub mod preprocess;

pub use preprocess::{preprocess, InputTensor, MeanSubtraction, RgbView};

use crate::boxes::{BoxTable, PredictionView, PriorBoxes};
use crate::codec::{denormalize, ImageShape};
use crate::pipeline::{detect, DetectConfig};
use crate::trace::{trace_event, trace_span};
use crate::util::SsdPostResult;

/// Capability interface of a detection network.
///
/// Any backend that maps a preprocessed image to a flat row-major
/// `[num_priors, output_width]` prediction buffer can be plugged in.
pub trait Predictor {
    /// Runs the network on a preprocessed input tensor.
    fn predict(&self, input: &InputTensor) -> SsdPostResult<Vec<f32>>;

    /// Expected input size as `(height, width)`.
    fn input_size(&self) -> (usize, usize);

    /// Values per prediction row: four offsets plus the class scores.
    fn output_width(&self) -> usize;
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict(&self, input: &InputTensor) -> SsdPostResult<Vec<f32>> {
        (**self).predict(input)
    }

    fn input_size(&self) -> (usize, usize) {
        (**self).input_size()
    }

    fn output_width(&self) -> usize {
        (**self).output_width()
    }
}

/// Preprocessing and detection parameters for the `infer_*` functions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InferConfig {
    pub mean: MeanSubtraction,
    pub detect: DetectConfig,
}

/// Runs inference on an image already resized to the predictor input size.
///
/// Boxes are returned in pixel coordinates of `original_shape`.
pub fn infer_from_array<P: Predictor>(
    image: RgbView<'_>,
    predictor: &P,
    original_shape: ImageShape,
    priors: &PriorBoxes,
) -> SsdPostResult<BoxTable> {
    infer_from_array_with_config(image, predictor, original_shape, priors, &InferConfig::default())
}

/// [`infer_from_array`] with explicit parameters.
pub fn infer_from_array_with_config<P: Predictor>(
    image: RgbView<'_>,
    predictor: &P,
    original_shape: ImageShape,
    priors: &PriorBoxes,
    cfg: &InferConfig,
) -> SsdPostResult<BoxTable> {
    let _span = trace_span!("infer", width = image.width(), height = image.height()).entered();
    original_shape.validate()?;
    let output_width = predictor.output_width();
    let input = preprocess(image, &cfg.mean);
    let raw = predictor.predict(&input)?;
    let predictions = PredictionView::from_slice(&raw, output_width)?;

    match detect(predictions, priors, &cfg.detect)? {
        Some(boxes) => {
            trace_event!("infer_detections", count = boxes.len());
            Ok(denormalize(&boxes, original_shape))
        }
        None => BoxTable::empty_sentinel(output_width),
    }
}

#[cfg(test)]
mod tests {
    use super::{infer_from_array, InputTensor, Predictor, RgbView};
    use crate::boxes::{PriorBox, PriorBoxes};
    use crate::codec::ImageShape;
    use crate::util::{SsdPostError, SsdPostResult};

    struct Failing;

    impl Predictor for Failing {
        fn predict(&self, _input: &InputTensor) -> SsdPostResult<Vec<f32>> {
            Err(SsdPostError::Predictor {
                reason: "device lost".to_string(),
            })
        }

        fn input_size(&self) -> (usize, usize) {
            (1, 1)
        }

        fn output_width(&self) -> usize {
            6
        }
    }

    #[test]
    fn predictor_errors_propagate() {
        let pixels = [0u8; 3];
        let image = RgbView::from_slice(&pixels, 1, 1).unwrap();
        let priors = PriorBoxes::new(vec![PriorBox::new(0.5, 0.5, 1.0, 1.0)]);
        let err = infer_from_array(image, &Failing, ImageShape::new(10, 10), &priors).unwrap_err();
        assert_eq!(
            err,
            SsdPostError::Predictor {
                reason: "device lost".to_string()
            }
        );
    }
}
