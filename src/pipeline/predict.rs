//! Threshold-first prediction path.

use crate::boxes::{BoxTable, PredictionView, PriorBoxes};
use crate::codec::{decode, denormalize, ImageShape};
use crate::filter::filter_boxes;
use crate::nms::ClassGroup;
use crate::pipeline::{concat_groups, suppress_all, PredictConfig};
use crate::trace::trace_span;
use crate::util::{SsdPostError, SsdPostResult};

/// Decodes, filters by class threshold, suppresses per class and maps the
/// survivors to pixel coordinates of `original_shape`.
///
/// Classes `1..num_classes` are visited in ascending order, skipping
/// `background_index`. Returns `Ok(None)` when the filter or the
/// suppression leaves nothing.
pub fn predict(
    predictions: PredictionView<'_>,
    priors: &PriorBoxes,
    original_shape: ImageShape,
    cfg: &PredictConfig,
) -> SsdPostResult<Option<BoxTable>> {
    cfg.validate()?;
    original_shape.validate()?;
    if predictions.num_classes() != cfg.num_classes {
        return Err(SsdPostError::ClassCountMismatch {
            expected: cfg.num_classes,
            got: predictions.num_classes(),
        });
    }
    let _span = trace_span!("predict", rows = predictions.rows()).entered();

    let decoded = decode(predictions, priors, cfg.scale_factors)?;
    let Some(selected) = filter_boxes(
        &decoded,
        cfg.num_classes,
        cfg.background_index,
        cfg.class_threshold,
    )?
    else {
        return Ok(None);
    };

    let best_classes = selected.best_classes();
    let mut groups = Vec::new();
    for class_id in (1..cfg.num_classes).filter(|&c| c != cfg.background_index) {
        let members: Vec<usize> = best_classes
            .iter()
            .enumerate()
            .filter(|(_, best)| **best == Some(class_id))
            .map(|(idx, _)| idx)
            .collect();
        if members.is_empty() {
            continue;
        }
        groups.push(ClassGroup {
            class_id,
            boxes: selected.select(&members),
        });
    }

    let suppressed = suppress_all(groups, cfg.iou_threshold, cfg.parallel);
    let boxes = concat_groups(&suppressed, selected.row_len());
    Ok(boxes.map(|boxes| denormalize(&boxes, original_shape)))
}
