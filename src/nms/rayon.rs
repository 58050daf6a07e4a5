//! Rayon-parallel per-class suppression (feature-gated).
//!
//! Classes are independent, so each group is suppressed on its own worker.
//! Results are collected in input order, making the output identical to
//! [`super::suppress_groups`].

use crate::nms::{suppress, ClassGroup};
use rayon::prelude::*;

/// Parallel counterpart of [`super::suppress_groups`].
pub fn suppress_groups_par(groups: Vec<ClassGroup>, iou_threshold: f32) -> Vec<ClassGroup> {
    groups
        .into_par_iter()
        .map(|group| ClassGroup {
            class_id: group.class_id,
            boxes: suppress(&group.boxes, iou_threshold),
        })
        .collect()
}
