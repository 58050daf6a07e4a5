//! Python bindings for the ssdpost SSD post-processing library.
//!
//! Arrays cross the boundary as contiguous float32 numpy arrays; "no
//! detections" is returned as `None`.

use numpy::{IntoPyArray, PyArray2, PyArrayMethods, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use ssdpost::{
    BoxCorners, BoxTable, DetectConfig, ImageShape, PredictConfig, PredictionView, PriorBoxes,
    ScaleFactors, SsdPostError,
};

/// Convert an SsdPostError to a Python exception.
fn to_py_err(err: SsdPostError) -> PyErr {
    match err {
        SsdPostError::ShapeMismatch { .. }
        | SsdPostError::InvalidRowLength { .. }
        | SsdPostError::InvalidBufferLength { .. }
        | SsdPostError::ClassCountMismatch { .. }
        | SsdPostError::LengthMismatch { .. }
        | SsdPostError::InvalidDimensions { .. }
        | SsdPostError::InvalidConfig(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn priors_from_array(priors: &PyReadonlyArray2<'_, f32>) -> PyResult<PriorBoxes> {
    if priors.shape()[1] != 4 {
        return Err(PyValueError::new_err("prior_boxes must have shape (N, 4)"));
    }
    PriorBoxes::from_flat(priors.as_slice()?).map_err(to_py_err)
}

fn table_to_array<'py>(py: Python<'py>, table: BoxTable) -> PyResult<Bound<'py, PyArray2<f32>>> {
    let rows = table.len();
    let cols = table.row_len();
    table.into_vec().into_pyarray(py).reshape([rows, cols])
}

fn scale_from(values: Option<[f32; 4]>) -> ScaleFactors {
    values.map(ScaleFactors::from_array).unwrap_or_default()
}

/// Decode raw predictions against prior boxes.
///
/// Args:
///     predictions: float32 array (num_priors, 4 + num_classes)
///     prior_boxes: float32 array (num_priors, 4) of cx, cy, w, h
///     scale_factors: four offset multipliers (default: [0.1, 0.1, 0.2, 0.2])
///
/// Returns:
///     float32 array (num_priors, 4 + num_classes) of corners and scores
#[pyfunction]
#[pyo3(signature = (predictions, prior_boxes, scale_factors = None))]
fn decode<'py>(
    py: Python<'py>,
    predictions: PyReadonlyArray2<'py, f32>,
    prior_boxes: PyReadonlyArray2<'py, f32>,
    scale_factors: Option<[f32; 4]>,
) -> PyResult<Bound<'py, PyArray2<f32>>> {
    let priors = priors_from_array(&prior_boxes)?;
    let view = PredictionView::from_slice(predictions.as_slice()?, predictions.shape()[1])
        .map_err(to_py_err)?;
    let decoded = ssdpost::decode(view, &priors, scale_from(scale_factors)).map_err(to_py_err)?;
    table_to_array(py, decoded)
}

/// Scale normalized corners to pixels.
///
/// Args:
///     boxes: float32 array (N, 4) of corners, or (N, 4 + num_classes) rows
///     original_shape: (height, width), both non-zero
///
/// Returns:
///     float32 array with the same shape as `boxes`; score columns untouched
#[pyfunction]
fn denormalize<'py>(
    py: Python<'py>,
    boxes: PyReadonlyArray2<'py, f32>,
    original_shape: (usize, usize),
) -> PyResult<Bound<'py, PyArray2<f32>>> {
    let shape = ImageShape::from(original_shape);
    shape.validate().map_err(to_py_err)?;
    let cols = boxes.shape()[1];
    if cols == 4 {
        let corners: Vec<BoxCorners> = boxes
            .as_slice()?
            .chunks_exact(4)
            .filter_map(BoxCorners::from_row)
            .collect();
        let flat: Vec<f32> = ssdpost::denormalize_corners(&corners, shape)
            .into_iter()
            .flat_map(BoxCorners::to_array)
            .collect();
        return flat.into_pyarray(py).reshape([corners.len(), 4]);
    }
    let table = BoxTable::from_vec(boxes.as_slice()?.to_vec(), cols).map_err(to_py_err)?;
    table_to_array(py, ssdpost::denormalize(&table, shape))
}

/// Confidence-masked detection with per-class NMS (normalized output).
///
/// Returns:
///     float32 array of surviving rows, or None when nothing is detected
#[pyfunction]
#[pyo3(signature = (
    predictions,
    prior_boxes,
    confidence_threshold = 0.01,
    iou_threshold = 0.45,
    scale_factors = None,
    parallel = false
))]
fn detect<'py>(
    py: Python<'py>,
    predictions: PyReadonlyArray2<'py, f32>,
    prior_boxes: PyReadonlyArray2<'py, f32>,
    confidence_threshold: f32,
    iou_threshold: f32,
    scale_factors: Option<[f32; 4]>,
    parallel: bool,
) -> PyResult<Option<Bound<'py, PyArray2<f32>>>> {
    let priors = priors_from_array(&prior_boxes)?;
    let view = PredictionView::from_slice(predictions.as_slice()?, predictions.shape()[1])
        .map_err(to_py_err)?;
    let cfg = DetectConfig {
        confidence_threshold,
        iou_threshold,
        scale_factors: scale_from(scale_factors),
        parallel,
    };
    match ssdpost::detect(view, &priors, &cfg).map_err(to_py_err)? {
        Some(table) => table_to_array(py, table).map(Some),
        None => Ok(None),
    }
}

/// Threshold-first prediction with per-class NMS, in pixel coordinates.
///
/// Returns:
///     float32 array of surviving rows, or None when nothing is detected
#[pyfunction]
#[pyo3(signature = (
    predictions,
    prior_boxes,
    original_shape,
    num_classes = 21,
    class_threshold = 0.1,
    iou_threshold = 0.45,
    background_index = 0,
    scale_factors = None,
    parallel = false
))]
#[allow(clippy::too_many_arguments)]
fn predict<'py>(
    py: Python<'py>,
    predictions: PyReadonlyArray2<'py, f32>,
    prior_boxes: PyReadonlyArray2<'py, f32>,
    original_shape: (usize, usize),
    num_classes: usize,
    class_threshold: f32,
    iou_threshold: f32,
    background_index: usize,
    scale_factors: Option<[f32; 4]>,
    parallel: bool,
) -> PyResult<Option<Bound<'py, PyArray2<f32>>>> {
    let priors = priors_from_array(&prior_boxes)?;
    let view = PredictionView::from_slice(predictions.as_slice()?, predictions.shape()[1])
        .map_err(to_py_err)?;
    let cfg = PredictConfig {
        num_classes,
        class_threshold,
        iou_threshold,
        background_index,
        scale_factors: scale_from(scale_factors),
        parallel,
    };
    let shape = ImageShape::from(original_shape);
    match ssdpost::predict(view, &priors, shape, &cfg).map_err(to_py_err)? {
        Some(table) => table_to_array(py, table).map(Some),
        None => Ok(None),
    }
}

/// Python module for SSD post-processing.
#[pymodule]
fn _ssdpost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode, m)?)?;
    m.add_function(wrap_pyfunction!(denormalize, m)?)?;
    m.add_function(wrap_pyfunction!(detect, m)?)?;
    m.add_function(wrap_pyfunction!(predict, m)?)?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
