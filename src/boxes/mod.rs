//! Box geometry, prior tables and row-major box tables.
//!
//! Boxes travel through the pipeline as rows of
//! `[x_min, y_min, x_max, y_max, score_0, ..., score_{C-1}]` inside a
//! [`BoxTable`]. Score column 0 is the background class. Raw network output is
//! borrowed through a [`PredictionView`] with the same row length, where the
//! first four columns hold regression offsets instead of corners.

pub mod prior;
pub mod table;

pub use prior::{PriorBox, PriorBoxes};
pub use table::{BoxTable, Detection, PredictionView};

/// Number of coordinate columns preceding the class scores in every row.
pub const COORDS: usize = 4;

/// Axis-aligned box in corner form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCorners {
    /// Left edge.
    pub x_min: f32,
    /// Top edge.
    pub y_min: f32,
    /// Right edge.
    pub x_max: f32,
    /// Bottom edge.
    pub y_max: f32,
}

impl BoxCorners {
    /// Creates a box from its corners.
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a box from center and size.
    pub fn from_center(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        Self {
            x_min: center_x - half_w,
            y_min: center_y - half_h,
            x_max: center_x + half_w,
            y_max: center_y + half_h,
        }
    }

    /// Reads the first four values of a row as corners.
    ///
    /// Returns `None` if the row is shorter than four values.
    pub fn from_row(row: &[f32]) -> Option<Self> {
        match row {
            [x_min, y_min, x_max, y_max, ..] => Some(Self::new(*x_min, *y_min, *x_max, *y_max)),
            _ => None,
        }
    }

    /// Returns the corners as `[x_min, y_min, x_max, y_max]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }

    /// Signed width; negative for inverted boxes.
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    /// Signed height; negative for inverted boxes.
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Area with inverted extents clamped to zero.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Returns true if the box has no positive area.
    pub fn is_degenerate(&self) -> bool {
        !(self.area() > 0.0)
    }

    /// Intersection-over-union with another box.
    ///
    /// Degenerate boxes (zero area, inverted, or NaN corners) have an IoU of
    /// zero against anything, including themselves. The result is symmetric
    /// and equals exactly `1.0` for a non-degenerate box against itself.
    pub fn iou(&self, other: &BoxCorners) -> f32 {
        let area_a = self.area();
        let area_b = other.area();
        if !(area_a > 0.0) || !(area_b > 0.0) {
            return 0.0;
        }

        let inter_w = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let inter_h = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        let intersection = inter_w * inter_h;
        let union = area_a + area_b - intersection;
        if !(union > 0.0) {
            return 0.0;
        }
        intersection / union
    }

    /// Scales x by `width` and y by `height`, without clamping.
    pub fn scale(self, height: f32, width: f32) -> Self {
        Self {
            x_min: self.x_min * width,
            y_min: self.y_min * height,
            x_max: self.x_max * width,
            y_max: self.y_max * height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BoxCorners;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BoxCorners::new(0.1, 0.2, 0.4, 0.9);
        assert_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = BoxCorners::new(0.0, 0.0, 2.0, 1.0);
        let b = BoxCorners::new(1.0, 0.0, 3.0, 1.0);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn degenerate_boxes_never_overlap() {
        let point = BoxCorners::new(0.5, 0.5, 0.5, 0.5);
        let inverted = BoxCorners::new(0.8, 0.8, 0.2, 0.2);
        let normal = BoxCorners::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(point.iou(&point), 0.0);
        assert_eq!(point.iou(&normal), 0.0);
        assert_eq!(inverted.iou(&normal), 0.0);
        assert!(inverted.is_degenerate());
        assert!(!normal.is_degenerate());
    }

    #[test]
    fn from_center_is_symmetric() {
        let b = BoxCorners::from_center(0.5, 0.5, 0.2, 0.4);
        assert!((b.x_min - 0.4).abs() < 1e-6);
        assert!((b.y_min - 0.3).abs() < 1e-6);
        assert!((b.x_max - 0.6).abs() < 1e-6);
        assert!((b.y_max - 0.7).abs() < 1e-6);
    }
}
