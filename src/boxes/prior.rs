//! Precomputed prior (anchor) boxes.

use crate::boxes::{BoxCorners, COORDS};
use crate::util::{SsdPostError, SsdPostResult};

/// Fixed reference box in normalized `[0, 1]` image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriorBox {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl PriorBox {
    /// Creates a prior from center and size.
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Corner form of the prior.
    pub fn corners(&self) -> BoxCorners {
        BoxCorners::from_center(self.center_x, self.center_y, self.width, self.height)
    }
}

/// Immutable table of prior boxes indexed by prediction row.
///
/// The table is loaded once per model and only ever read, so it can be shared
/// across threads (for example behind an `Arc`) without locking.
#[derive(Clone, Debug, PartialEq)]
pub struct PriorBoxes {
    boxes: Vec<PriorBox>,
}

impl PriorBoxes {
    /// Wraps an existing list of priors.
    pub fn new(boxes: Vec<PriorBox>) -> Self {
        Self { boxes }
    }

    /// Builds the table from a row-major `[num_priors, 4]` buffer of
    /// `center_x, center_y, width, height`.
    pub fn from_flat(data: &[f32]) -> SsdPostResult<Self> {
        if data.len() % COORDS != 0 {
            return Err(SsdPostError::InvalidBufferLength {
                len: data.len(),
                row_len: COORDS,
            });
        }
        let boxes = data
            .chunks_exact(COORDS)
            .map(|row| PriorBox::new(row[0], row[1], row[2], row[3]))
            .collect();
        Ok(Self { boxes })
    }

    /// Number of priors.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns true if the table holds no priors.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Returns the prior at `idx`.
    pub fn get(&self, idx: usize) -> Option<&PriorBox> {
        self.boxes.get(idx)
    }

    /// Iterates priors in row order.
    pub fn iter(&self) -> std::slice::Iter<'_, PriorBox> {
        self.boxes.iter()
    }

    /// Borrows the priors as a slice.
    pub fn as_slice(&self) -> &[PriorBox] {
        &self.boxes
    }
}

impl FromIterator<PriorBox> for PriorBoxes {
    fn from_iter<I: IntoIterator<Item = PriorBox>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
