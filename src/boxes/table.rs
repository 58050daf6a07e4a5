//! Row-major prediction views and owned box tables.

use crate::boxes::{BoxCorners, COORDS};
use crate::util::math::{argmax, max_score};
use crate::util::{SsdPostError, SsdPostResult};

/// Smallest valid row: four coordinates, a background score and one class.
pub(crate) const MIN_ROW_LEN: usize = COORDS + 2;

fn check_layout(len: usize, row_len: usize) -> SsdPostResult<()> {
    if row_len < MIN_ROW_LEN {
        return Err(SsdPostError::InvalidRowLength {
            row_len,
            min: MIN_ROW_LEN,
        });
    }
    if len % row_len != 0 {
        return Err(SsdPostError::InvalidBufferLength { len, row_len });
    }
    Ok(())
}

/// Borrowed `[num_priors, 4 + num_classes]` view of raw network output.
///
/// Each row holds `[offset_cx, offset_cy, offset_w, offset_h, score_0, ...]`.
#[derive(Copy, Clone, Debug)]
pub struct PredictionView<'a> {
    data: &'a [f32],
    row_len: usize,
}

impl<'a> PredictionView<'a> {
    /// Creates a view over a contiguous row-major buffer.
    pub fn from_slice(data: &'a [f32], row_len: usize) -> SsdPostResult<Self> {
        check_layout(data.len(), row_len)?;
        Ok(Self { data, row_len })
    }

    /// Number of rows (one per prior).
    pub fn rows(&self) -> usize {
        self.data.len() / self.row_len
    }

    /// Number of values per row.
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Number of score columns, background included.
    pub fn num_classes(&self) -> usize {
        self.row_len - COORDS
    }

    /// Returns row `idx`.
    pub fn row(&self, idx: usize) -> Option<&'a [f32]> {
        let start = idx.checked_mul(self.row_len)?;
        let end = start.checked_add(self.row_len)?;
        self.data.get(start..end)
    }

    /// Iterates rows in prior order.
    pub fn iter_rows(&self) -> std::slice::ChunksExact<'a, f32> {
        self.data.chunks_exact(self.row_len)
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }
}

/// Owned table of boxes in corner form followed by class scores.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxTable {
    data: Vec<f32>,
    row_len: usize,
}

impl BoxTable {
    /// Creates an empty table with the given row length.
    pub fn new(row_len: usize) -> SsdPostResult<Self> {
        Self::from_vec(Vec::new(), row_len)
    }

    /// Wraps a row-major buffer.
    pub fn from_vec(data: Vec<f32>, row_len: usize) -> SsdPostResult<Self> {
        check_layout(data.len(), row_len)?;
        Ok(Self { data, row_len })
    }

    /// Single all-zero row, used to report "no detections" with a fixed width.
    pub fn empty_sentinel(row_len: usize) -> SsdPostResult<Self> {
        Self::from_vec(vec![0.0; row_len], row_len)
    }

    pub(crate) fn with_capacity(rows: usize, row_len: usize) -> Self {
        Self {
            data: Vec::with_capacity(rows * row_len),
            row_len,
        }
    }

    /// Appends a row. Panics if its length differs from the table's.
    pub(crate) fn push_row(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.row_len, "row length mismatch");
        self.data.extend_from_slice(row);
    }

    /// Appends all rows of another table with the same row length.
    pub(crate) fn append(&mut self, other: &BoxTable) {
        assert_eq!(other.row_len, self.row_len, "row length mismatch");
        self.data.extend_from_slice(&other.data);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len() / self.row_len
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true for the single all-zero "no detections" row.
    pub fn is_empty_sentinel(&self) -> bool {
        self.len() == 1 && self.data.iter().all(|&v| v == 0.0)
    }

    /// Number of values per row.
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Number of score columns, background included.
    pub fn num_classes(&self) -> usize {
        self.row_len - COORDS
    }

    /// Returns row `idx`.
    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        let start = idx.checked_mul(self.row_len)?;
        let end = start.checked_add(self.row_len)?;
        self.data.get(start..end)
    }

    /// Iterates rows in order.
    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.row_len)
    }

    /// Corners of row `idx`.
    pub fn corners(&self, idx: usize) -> Option<BoxCorners> {
        self.row(idx).and_then(BoxCorners::from_row)
    }

    /// Score columns of row `idx`.
    pub fn scores(&self, idx: usize) -> Option<&[f32]> {
        self.row(idx).map(|row| &row[COORDS..])
    }

    /// Index of the best-scoring class of row `idx` (first on ties).
    pub fn best_class(&self, idx: usize) -> Option<usize> {
        self.scores(idx).and_then(argmax)
    }

    /// Best-class index for every row, in order.
    pub fn best_classes(&self) -> Vec<Option<usize>> {
        self.iter_rows().map(|row| argmax(&row[COORDS..])).collect()
    }

    /// Highest class score of every row, in order.
    pub fn max_scores(&self) -> Vec<f32> {
        self.iter_rows().map(|row| max_score(&row[COORDS..])).collect()
    }

    /// Copies the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> BoxTable {
        let mut out = BoxTable::with_capacity(indices.len(), self.row_len);
        for &idx in indices {
            if let Some(row) = self.row(idx) {
                out.push_row(row);
            }
        }
        out
    }

    /// Copies every row for which `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> BoxTable
    where
        F: FnMut(usize, &[f32]) -> bool,
    {
        let mut out = BoxTable::with_capacity(0, self.row_len);
        for (idx, row) in self.iter_rows().enumerate() {
            if keep(idx, row) {
                out.push_row(row);
            }
        }
        out
    }

    /// Returns a copy with every row's corners mapped through `f`.
    pub fn map_corners<F>(&self, mut f: F) -> BoxTable
    where
        F: FnMut(BoxCorners) -> BoxCorners,
    {
        let mut data = self.data.clone();
        for row in data.chunks_exact_mut(self.row_len) {
            if let Some(corners) = BoxCorners::from_row(row) {
                row[..COORDS].copy_from_slice(&f(corners).to_array());
            }
        }
        BoxTable {
            data,
            row_len: self.row_len,
        }
    }

    /// Typed readout of every row: corners, best class and its score.
    pub fn detections(&self) -> impl Iterator<Item = Detection> + '_ {
        self.iter_rows().filter_map(Detection::from_row)
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the table, returning the row-major buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// A single detection read out of a [`BoxTable`] row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Box corners, normalized or in pixels depending on the producing stage.
    pub corners: BoxCorners,
    /// Index of the best-scoring class (0 is background).
    pub class_id: usize,
    /// Score of `class_id`.
    pub score: f32,
}

impl Detection {
    /// Reads a detection from a `[corners..., scores...]` row.
    pub fn from_row(row: &[f32]) -> Option<Self> {
        let corners = BoxCorners::from_row(row)?;
        let scores = row.get(COORDS..)?;
        let class_id = argmax(scores)?;
        Some(Self {
            corners,
            class_id,
            score: scores[class_id],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BoxTable, PredictionView};
    use crate::util::SsdPostError;

    #[test]
    fn prediction_view_validates_layout() {
        let data = [0.0f32; 12];
        let view = PredictionView::from_slice(&data, 6).unwrap();
        assert_eq!(view.rows(), 2);
        assert_eq!(view.num_classes(), 2);

        let err = PredictionView::from_slice(&data, 5).unwrap_err();
        assert_eq!(
            err,
            SsdPostError::InvalidRowLength { row_len: 5, min: 6 }
        );
        let err = PredictionView::from_slice(&data[..11], 6).unwrap_err();
        assert_eq!(
            err,
            SsdPostError::InvalidBufferLength {
                len: 11,
                row_len: 6
            }
        );
    }

    #[test]
    fn best_class_and_select() {
        let table = BoxTable::from_vec(
            vec![
                0.0, 0.0, 1.0, 1.0, 0.1, 0.9, //
                0.0, 0.0, 1.0, 1.0, 0.8, 0.2, //
            ],
            6,
        )
        .unwrap();
        assert_eq!(table.best_classes(), vec![Some(1), Some(0)]);
        let picked = table.select(&[1]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked.best_class(0), Some(0));
    }

    #[test]
    fn empty_sentinel_is_a_single_zero_row() {
        let sentinel = BoxTable::empty_sentinel(7).unwrap();
        assert_eq!(sentinel.len(), 1);
        assert!(sentinel.is_empty_sentinel());
        assert!(!BoxTable::new(7).unwrap().is_empty_sentinel());
    }

    #[test]
    fn detections_read_class_and_score() {
        let table = BoxTable::from_vec(vec![1.0, 2.0, 3.0, 4.0, 0.1, 0.3, 0.6], 7).unwrap();
        let det = table.detections().next().unwrap();
        assert_eq!(det.class_id, 2);
        assert!((det.score - 0.6).abs() < 1e-6);
        assert_eq!(det.corners.x_max, 3.0);
    }
}
