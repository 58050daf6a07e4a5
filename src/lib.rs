//! ssdpost turns raw SSD detector output into final detections.
//!
//! The crate decodes per-prior regression offsets against a precomputed prior
//! table, filters weak and background rows, runs greedy per-class
//! non-maximum suppression and maps the survivors to pixel coordinates.
//! Per-class suppression can run in parallel via the `rayon` feature, and
//! image loading is available behind `image-io`.
//!
//! "No detections" is a regular outcome: [`detect`] and [`predict`] return
//! `Ok(None)`, while the `infer_*` wrappers return a single all-zero row.

pub mod boxes;
pub mod codec;
pub mod filter;
pub mod infer;
pub mod lowlevel;
pub mod nms;
pub mod pipeline;
mod trace;
pub mod util;

pub use boxes::{BoxCorners, BoxTable, Detection, PredictionView, PriorBox, PriorBoxes};
pub use codec::{decode, denormalize, denormalize_corners, ImageShape, ScaleFactors};
pub use filter::filter_boxes;
pub use infer::{
    infer_from_array, infer_from_array_with_config, InferConfig, InputTensor, MeanSubtraction,
    Predictor, RgbView,
};
pub use nms::suppress;
pub use pipeline::{detect, predict, DetectConfig, PredictConfig};
pub use util::{SsdPostError, SsdPostResult};

#[cfg(feature = "image-io")]
pub use infer::io;
#[cfg(feature = "image-io")]
pub use infer::io::{infer_from_path, infer_from_path_with_config};
