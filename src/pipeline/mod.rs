//! Detection orchestrator: decode, filter, per-class NMS, concatenate.
//!
//! Two variants are provided. [`predict`] filters by class threshold first,
//! suppresses per class and maps the result to pixels. [`detect`] masks rows
//! by their global maximum score per class and stays in normalized
//! coordinates. Both skip class 0 (background) and report "no detections" as
//! `Ok(None)`.

mod detect;
mod predict;

pub use detect::detect;
pub use predict::predict;

use crate::boxes::BoxTable;
use crate::codec::ScaleFactors;
use crate::nms::{self, ClassGroup};
use crate::trace::{trace_debug, trace_event};
use crate::util::{SsdPostError, SsdPostResult};

/// Parameters for the confidence-masked [`detect`] path.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Rows whose highest class score is not above this are dropped.
    pub confidence_threshold: f32,
    /// Boxes overlapping a kept box by more than this IoU are suppressed.
    pub iou_threshold: f32,
    /// Offset scale factors used during decoding.
    pub scale_factors: ScaleFactors,
    /// Suppress classes in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.01,
            iou_threshold: 0.45,
            scale_factors: ScaleFactors::default(),
            parallel: false,
        }
    }
}

impl DetectConfig {
    /// Validates thresholds and scale factors.
    pub fn validate(&self) -> SsdPostResult<()> {
        if self.confidence_threshold.is_nan() {
            return Err(SsdPostError::InvalidConfig(
                "confidence_threshold must not be NaN",
            ));
        }
        validate_iou(self.iou_threshold)?;
        self.scale_factors.validate()
    }
}

/// Parameters for the threshold-first [`predict`] path.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictConfig {
    /// Score columns per row, background included.
    pub num_classes: usize,
    /// Rows whose best class score is not above this are dropped.
    pub class_threshold: f32,
    /// Boxes overlapping a kept box by more than this IoU are suppressed.
    pub iou_threshold: f32,
    /// Class index treated as "no object" by the filter.
    pub background_index: usize,
    /// Offset scale factors used during decoding.
    pub scale_factors: ScaleFactors,
    /// Suppress classes in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            num_classes: 21,
            class_threshold: 0.1,
            iou_threshold: 0.45,
            background_index: 0,
            scale_factors: ScaleFactors::default(),
            parallel: false,
        }
    }
}

impl PredictConfig {
    /// Validates class layout, thresholds and scale factors.
    pub fn validate(&self) -> SsdPostResult<()> {
        if self.num_classes < 2 {
            return Err(SsdPostError::InvalidConfig(
                "num_classes must include background and at least one class",
            ));
        }
        if self.background_index >= self.num_classes {
            return Err(SsdPostError::InvalidConfig(
                "background_index must be below num_classes",
            ));
        }
        if self.class_threshold.is_nan() {
            return Err(SsdPostError::InvalidConfig(
                "class_threshold must not be NaN",
            ));
        }
        validate_iou(self.iou_threshold)?;
        self.scale_factors.validate()
    }
}

fn validate_iou(iou_threshold: f32) -> SsdPostResult<()> {
    if !(0.0..=1.0).contains(&iou_threshold) {
        return Err(SsdPostError::InvalidConfig("iou_threshold must lie in [0, 1]"));
    }
    Ok(())
}

/// Candidate and survivor counts for one class's NMS pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ClassNmsCounts {
    pub class_id: usize,
    pub candidates: usize,
    pub kept: usize,
}

/// Pairs pre-NMS row counts with the suppressed groups, in group order.
pub(crate) fn class_nms_counts(
    candidates: &[usize],
    groups: &[ClassGroup],
) -> Vec<ClassNmsCounts> {
    candidates
        .iter()
        .zip(groups)
        .map(|(&candidates, group)| ClassNmsCounts {
            class_id: group.class_id,
            candidates,
            kept: group.boxes.len(),
        })
        .collect()
}

/// Runs NMS on every group and reports per-class counts.
fn suppress_all(groups: Vec<ClassGroup>, iou_threshold: f32, parallel: bool) -> Vec<ClassGroup> {
    let candidates: Vec<usize> = groups.iter().map(|g| g.boxes.len()).collect();
    let suppressed = dispatch_nms(groups, iou_threshold, parallel);
    for counts in class_nms_counts(&candidates, &suppressed) {
        trace_debug!(
            "class_nms",
            class_id = counts.class_id,
            candidates = counts.candidates,
            kept = counts.kept
        );
    }
    suppressed
}

/// One rayon task per class when `parallel` is set.
#[cfg(feature = "rayon")]
fn dispatch_nms(groups: Vec<ClassGroup>, iou_threshold: f32, parallel: bool) -> Vec<ClassGroup> {
    if parallel {
        nms::rayon::suppress_groups_par(groups, iou_threshold)
    } else {
        nms::suppress_groups(groups, iou_threshold)
    }
}

/// `parallel` has no effect without `rayon`.
#[cfg(not(feature = "rayon"))]
fn dispatch_nms(groups: Vec<ClassGroup>, iou_threshold: f32, _parallel: bool) -> Vec<ClassGroup> {
    nms::suppress_groups(groups, iou_threshold)
}

/// Concatenates groups in class order; `None` if no row survived.
fn concat_groups(groups: &[ClassGroup], row_len: usize) -> Option<BoxTable> {
    let rows: usize = groups.iter().map(|g| g.boxes.len()).sum();
    if rows == 0 {
        trace_event!("no_detections", classes = groups.len());
        return None;
    }
    let mut out = BoxTable::with_capacity(rows, row_len);
    for group in groups {
        out.append(&group.boxes);
    }
    trace_event!("detections", classes = groups.len(), rows = rows);
    Some(out)
}
