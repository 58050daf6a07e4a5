//! Image loading via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::boxes::{BoxTable, PriorBoxes};
use crate::codec::ImageShape;
use crate::infer::{infer_from_array_with_config, InferConfig, Predictor, RgbView};
use crate::trace::trace_event;
use crate::util::{SsdPostError, SsdPostResult};
use image::imageops::FilterType;
use image::RgbImage;
use std::path::Path;

/// An RGB image together with the size it had on disk.
pub struct LoadedImage {
    /// Pixels, resized if a target size was requested.
    pub rgb: RgbImage,
    /// `(height, width)` before resizing.
    pub original_shape: ImageShape,
}

impl LoadedImage {
    /// Borrows the pixels as an [`RgbView`].
    pub fn view(&self) -> SsdPostResult<RgbView<'_>> {
        view_from_rgb_image(&self.rgb)
    }
}

fn io_error(err: image::ImageError) -> SsdPostError {
    SsdPostError::ImageIo {
        reason: err.to_string(),
    }
}

/// Creates a borrowed view from an RGB image buffer.
pub fn view_from_rgb_image(img: &RgbImage) -> SsdPostResult<RgbView<'_>> {
    RgbView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Loads an image as RGB8, optionally resizing it to `(height, width)`.
pub fn load_image<P: AsRef<Path>>(
    path: P,
    target_size: Option<(usize, usize)>,
) -> SsdPostResult<LoadedImage> {
    let rgb = image::open(path).map_err(io_error)?.to_rgb8();
    let original_shape = ImageShape::new(rgb.height() as usize, rgb.width() as usize);
    let rgb = match target_size {
        Some((height, width)) => {
            if height == 0 || width == 0 {
                return Err(SsdPostError::InvalidDimensions { width, height });
            }
            image::imageops::resize(&rgb, width as u32, height as u32, FilterType::Triangle)
        }
        None => rgb,
    };
    Ok(LoadedImage {
        rgb,
        original_shape,
    })
}

/// Reads the `(height, width)` of an image file without decoding pixels.
pub fn image_size<P: AsRef<Path>>(path: P) -> SsdPostResult<ImageShape> {
    let (width, height) = image::image_dimensions(path).map_err(io_error)?;
    Ok(ImageShape::new(height as usize, width as usize))
}

/// Loads an image, resizes it to the predictor input and runs inference.
///
/// Boxes are returned in pixel coordinates of the image as stored on disk.
pub fn infer_from_path<P: AsRef<Path>, M: Predictor>(
    path: P,
    predictor: &M,
    priors: &PriorBoxes,
) -> SsdPostResult<BoxTable> {
    infer_from_path_with_config(path, predictor, priors, &InferConfig::default())
}

/// [`infer_from_path`] with explicit parameters.
pub fn infer_from_path_with_config<P: AsRef<Path>, M: Predictor>(
    path: P,
    predictor: &M,
    priors: &PriorBoxes,
    cfg: &InferConfig,
) -> SsdPostResult<BoxTable> {
    let loaded = load_image(path, Some(predictor.input_size()))?;
    trace_event!(
        "image_loaded",
        height = loaded.original_shape.height,
        width = loaded.original_shape.width
    );
    infer_from_array_with_config(loaded.view()?, predictor, loaded.original_shape, priors, cfg)
}
