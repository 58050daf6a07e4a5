//! Error types for ssdpost.

use thiserror::Error;

/// Result alias for ssdpost operations.
pub type SsdPostResult<T> = std::result::Result<T, SsdPostError>;

/// Errors that can occur while decoding and suppressing detections.
///
/// An empty detection set is not an error; see [`crate::detect`] and
/// [`crate::predict`], which report it as `Ok(None)`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SsdPostError {
    /// The prior table and the prediction tensor disagree on the prior count.
    #[error("shape mismatch: {priors} prior boxes but {predictions} prediction rows")]
    ShapeMismatch { priors: usize, predictions: usize },
    /// Prediction rows are too short to hold offsets and class scores.
    #[error("invalid row length {row_len} (need at least {min})")]
    InvalidRowLength { row_len: usize, min: usize },
    /// A flat buffer does not split into whole rows.
    #[error("buffer of length {len} is not a multiple of row length {row_len}")]
    InvalidBufferLength { len: usize, row_len: usize },
    /// The configured class count does not match the score columns.
    #[error("class count mismatch: expected {expected} score columns, got {got}")]
    ClassCountMismatch { expected: usize, got: usize },
    /// NMS was handed a different number of boxes and scores.
    #[error("length mismatch: {boxes} boxes but {scores} scores")]
    LengthMismatch { boxes: usize, scores: usize },
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Image dimensions must be non-zero.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// An image buffer is shorter than its dimensions require.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Image decoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
    /// An injected predictor failed to produce output.
    #[error("predictor error: {reason}")]
    Predictor { reason: String },
}
