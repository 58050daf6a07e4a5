//! Greedy non-maximum suppression over boxes of a single class.
//!
//! Candidates are ordered by descending score with a stable sort, so boxes
//! with equal scores keep their input order. The engine then walks that
//! order once: each box not yet suppressed is kept, and every later box whose
//! IoU with it is strictly greater than the threshold is marked suppressed.
//! Cost is O(k²) in the number of candidates.

use crate::boxes::{BoxCorners, BoxTable};
use crate::util::{SsdPostError, SsdPostResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Boxes of one class awaiting (or after) suppression.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassGroup {
    /// Class index shared by every row.
    pub class_id: usize,
    /// Rows belonging to the class.
    pub boxes: BoxTable,
}

/// Candidate order: descending score, input order among equal scores.
fn score_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Runs greedy NMS and returns the indices of the surviving boxes.
///
/// `boxes` and `scores` are parallel slices. Indices are returned in
/// descending score order. A box is suppressed when its IoU with an already
/// kept box exceeds `iou_threshold`; degenerate boxes never suppress or get
/// suppressed since their IoU is zero.
///
/// Fails with [`SsdPostError::LengthMismatch`] when the slices differ in length.
pub fn suppress_indices(
    boxes: &[BoxCorners],
    scores: &[f32],
    iou_threshold: f32,
) -> SsdPostResult<Vec<usize>> {
    if boxes.len() != scores.len() {
        return Err(SsdPostError::LengthMismatch {
            boxes: boxes.len(),
            scores: scores.len(),
        });
    }
    Ok(greedy_keep(boxes, scores, iou_threshold))
}

/// Greedy walk over equally long `boxes` and `scores`.
fn greedy_keep(boxes: &[BoxCorners], scores: &[f32], iou_threshold: f32) -> Vec<usize> {
    let order = score_order(scores);
    let mut suppressed = vec![false; order.len()];
    let mut kept = Vec::new();

    for (pos, &idx) in order.iter().enumerate() {
        if suppressed[pos] {
            continue;
        }
        kept.push(idx);
        let seed = boxes[idx];
        for (later, &other) in order.iter().enumerate().skip(pos + 1) {
            if !suppressed[later] && seed.iou(&boxes[other]) > iou_threshold {
                suppressed[later] = true;
            }
        }
    }

    kept
}

fn suppress_with_scores(boxes: &BoxTable, scores: &[f32], iou_threshold: f32) -> BoxTable {
    let corners: Vec<BoxCorners> = (0..boxes.len())
        .filter_map(|idx| boxes.corners(idx))
        .collect();
    let kept = greedy_keep(&corners, scores, iou_threshold);
    boxes.select(&kept)
}

/// Suppresses overlapping rows, ranking each row by its highest class score.
///
/// Intended for rows that already share a best class, where the highest
/// score is that class's score. Output rows are in descending score order.
pub fn suppress(boxes: &BoxTable, iou_threshold: f32) -> BoxTable {
    suppress_with_scores(boxes, &boxes.max_scores(), iou_threshold)
}

/// Suppresses overlapping rows, ranking each row by its `class_id` score.
pub fn suppress_class(boxes: &BoxTable, class_id: usize, iou_threshold: f32) -> BoxTable {
    let scores: Vec<f32> = (0..boxes.len())
        .map(|idx| {
            boxes
                .scores(idx)
                .and_then(|s| s.get(class_id).copied())
                .unwrap_or(f32::NEG_INFINITY)
        })
        .collect();
    suppress_with_scores(boxes, &scores, iou_threshold)
}

/// Runs [`suppress`] on each group, preserving group order.
pub fn suppress_groups(groups: Vec<ClassGroup>, iou_threshold: f32) -> Vec<ClassGroup> {
    groups
        .into_iter()
        .map(|group| ClassGroup {
            class_id: group.class_id,
            boxes: suppress(&group.boxes, iou_threshold),
        })
        .collect()
}
