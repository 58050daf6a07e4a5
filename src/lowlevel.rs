//! Low-level building blocks for custom post-processing pipelines.
//!
//! Most users should prefer [`crate::detect`], [`crate::predict`] and the
//! `infer_*` wrappers; these re-exports cover stage-by-stage use.

pub use crate::codec::decode_offsets;
pub use crate::infer::preprocess::CHANNELS;
pub use crate::nms::{suppress_class, suppress_groups, suppress_indices, ClassGroup};

#[cfg(feature = "rayon")]
pub use crate::nms::rayon::suppress_groups_par;
