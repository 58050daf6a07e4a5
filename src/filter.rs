//! Class filter: drop priors whose best class is background or too weak.

use crate::boxes::{BoxTable, COORDS};
use crate::trace::trace_event;
use crate::util::math::argmax;
use crate::util::{SsdPostError, SsdPostResult};

/// Keeps rows whose best class is not `background_index` and whose best
/// score is strictly greater than `score_threshold`.
///
/// Returns `Ok(None)` when no row survives; this is the "no detections"
/// outcome, not a failure. `num_classes` must equal the table's score
/// column count.
pub fn filter_boxes(
    boxes: &BoxTable,
    num_classes: usize,
    background_index: usize,
    score_threshold: f32,
) -> SsdPostResult<Option<BoxTable>> {
    if boxes.num_classes() != num_classes {
        return Err(SsdPostError::ClassCountMismatch {
            expected: num_classes,
            got: boxes.num_classes(),
        });
    }
    if score_threshold.is_nan() {
        return Err(SsdPostError::InvalidConfig("score threshold must not be NaN"));
    }

    let kept = boxes.retain_rows(|_, row| {
        let scores = &row[COORDS..];
        match argmax(scores) {
            Some(best) => best != background_index && scores[best] > score_threshold,
            None => false,
        }
    });
    trace_event!("class_filter", input = boxes.len(), kept = kept.len());
    if kept.is_empty() {
        Ok(None)
    } else {
        Ok(Some(kept))
    }
}
