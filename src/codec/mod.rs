//! Box codec: SSD offset decoding and pixel denormalization.
//!
//! Offsets use the standard SSD parameterization. For prior `p` and raw
//! offsets `t`, with scale factors `s`:
//!
//! ```text
//! cx = p.cx + t.cx * s.x * p.w
//! cy = p.cy + t.cy * s.y * p.h
//! w  = p.w * exp(t.w * s.w)
//! h  = p.h * exp(t.h * s.h)
//! ```
//!
//! The decoded center/size box is converted to corner form and the class
//! score columns are copied through unchanged.

use crate::boxes::{BoxCorners, BoxTable, PredictionView, PriorBox, PriorBoxes, COORDS};
use crate::trace::{trace_event, trace_span};
use crate::util::{SsdPostError, SsdPostResult};

/// Per-coordinate multipliers applied to raw regression offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            x: 0.1,
            y: 0.1,
            w: 0.2,
            h: 0.2,
        }
    }
}

impl ScaleFactors {
    /// Unit scale: offsets are applied as-is.
    pub const UNIT: ScaleFactors = ScaleFactors {
        x: 1.0,
        y: 1.0,
        w: 1.0,
        h: 1.0,
    };

    /// Builds scale factors from `[x, y, w, h]`.
    pub fn from_array(values: [f32; 4]) -> Self {
        Self {
            x: values[0],
            y: values[1],
            w: values[2],
            h: values[3],
        }
    }

    /// Returns the factors as `[x, y, w, h]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.w, self.h]
    }

    /// Validates that every factor is finite.
    pub fn validate(&self) -> SsdPostResult<()> {
        if self.to_array().iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(SsdPostError::InvalidConfig("scale factors must be finite"))
        }
    }
}

/// Original image size used to map normalized boxes to pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
}

impl ImageShape {
    /// Creates a shape from height and width.
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Rejects shapes with a zero height or width.
    pub fn validate(&self) -> SsdPostResult<()> {
        if self.height == 0 || self.width == 0 {
            return Err(SsdPostError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl From<(usize, usize)> for ImageShape {
    /// Converts a `(height, width)` pair.
    fn from((height, width): (usize, usize)) -> Self {
        Self { height, width }
    }
}

/// Decodes the four offsets of one row against its prior.
pub fn decode_offsets(offsets: [f32; 4], prior: &PriorBox, scale: ScaleFactors) -> BoxCorners {
    let center_x = prior.center_x + offsets[0] * scale.x * prior.width;
    let center_y = prior.center_y + offsets[1] * scale.y * prior.height;
    let width = prior.width * (offsets[2] * scale.w).exp();
    let height = prior.height * (offsets[3] * scale.h).exp();
    BoxCorners::from_center(center_x, center_y, width, height)
}

/// Decodes raw predictions into corner-form boxes with their class scores.
///
/// Output row `i` corresponds to prior `i`. Fails with
/// [`SsdPostError::ShapeMismatch`] when the prior count differs from the
/// number of prediction rows.
pub fn decode(
    predictions: PredictionView<'_>,
    priors: &PriorBoxes,
    scale: ScaleFactors,
) -> SsdPostResult<BoxTable> {
    let _span = trace_span!("decode", rows = predictions.rows()).entered();
    if predictions.rows() != priors.len() {
        return Err(SsdPostError::ShapeMismatch {
            priors: priors.len(),
            predictions: predictions.rows(),
        });
    }
    scale.validate()?;

    let mut data = Vec::with_capacity(predictions.as_slice().len());
    for (row, prior) in predictions.iter_rows().zip(priors.iter()) {
        let offsets = [row[0], row[1], row[2], row[3]];
        let corners = decode_offsets(offsets, prior, scale);
        data.extend_from_slice(&corners.to_array());
        data.extend_from_slice(&row[COORDS..]);
    }
    trace_event!("decoded", rows = priors.len());
    BoxTable::from_vec(data, predictions.row_len())
}

/// Maps normalized corners to pixels for an image of the given shape.
///
/// x coordinates are multiplied by the width and y coordinates by the height.
/// Nothing is clamped: coordinates outside the image are preserved.
pub fn denormalize(boxes: &BoxTable, shape: ImageShape) -> BoxTable {
    let height = shape.height as f32;
    let width = shape.width as f32;
    boxes.map_corners(|corners| corners.scale(height, width))
}

/// Maps bare normalized corners to pixels, as [`denormalize`] does for rows.
pub fn denormalize_corners(corners: &[BoxCorners], shape: ImageShape) -> Vec<BoxCorners> {
    let height = shape.height as f32;
    let width = shape.width as f32;
    corners.iter().map(|c| c.scale(height, width)).collect()
}
