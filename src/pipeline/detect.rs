//! Confidence-masked detection path.

use crate::boxes::{BoxTable, PredictionView, PriorBoxes};
use crate::codec::decode;
use crate::nms::ClassGroup;
use crate::pipeline::{concat_groups, suppress_all, DetectConfig};
use crate::trace::trace_span;
use crate::util::SsdPostResult;

/// Decodes predictions and suppresses duplicates per class.
///
/// For every class `c >= 1`, the candidates are the rows whose best class is
/// `c` and whose highest score over all classes (background included) is
/// strictly above `confidence_threshold`. Each class is suppressed on its
/// own and the survivors are concatenated in ascending class order, each
/// class block in descending score order. Boxes stay in normalized
/// coordinates.
///
/// Returns `Ok(None)` when no box survives.
pub fn detect(
    predictions: PredictionView<'_>,
    priors: &PriorBoxes,
    cfg: &DetectConfig,
) -> SsdPostResult<Option<BoxTable>> {
    cfg.validate()?;
    let _span = trace_span!("detect", rows = predictions.rows()).entered();

    let decoded = decode(predictions, priors, cfg.scale_factors)?;
    let best_classes = decoded.best_classes();
    let max_scores = decoded.max_scores();

    let mut groups = Vec::new();
    for class_id in 1..decoded.num_classes() {
        let mut members = Vec::new();
        for (idx, best) in best_classes.iter().enumerate() {
            if *best == Some(class_id) && max_scores[idx] > cfg.confidence_threshold {
                members.push(idx);
            }
        }
        if members.is_empty() {
            continue;
        }
        groups.push(ClassGroup {
            class_id,
            boxes: decoded.select(&members),
        });
    }

    let suppressed = suppress_all(groups, cfg.iou_threshold, cfg.parallel);
    Ok(concat_groups(&suppressed, decoded.row_len()))
}
