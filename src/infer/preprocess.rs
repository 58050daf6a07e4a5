//! Image views and mean-subtraction preprocessing for the network input.

use crate::util::{SsdPostError, SsdPostResult};

/// Number of interleaved channels in [`RgbView`] and [`InputTensor`].
pub const CHANNELS: usize = 3;

/// Per-channel means subtracted from RGB pixels before inference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanSubtraction {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for MeanSubtraction {
    fn default() -> Self {
        Self {
            r: 123.0,
            g: 117.0,
            b: 104.0,
        }
    }
}

/// Borrowed interleaved RGB8 image, rows packed without padding.
#[derive(Copy, Clone, Debug)]
pub struct RgbView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> RgbView<'a> {
    /// Creates a view over `width * height * 3` bytes.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> SsdPostResult<Self> {
        if width == 0 || height == 0 {
            return Err(SsdPostError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or(SsdPostError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(SsdPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data: &data[..needed],
            width,
            height,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the `[r, g, b]` pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * CHANNELS;
        let px = self.data.get(start..start + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns the packed pixel bytes.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}

/// Network input: interleaved HWC `f32` pixels in BGR order.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl InputTensor {
    /// Tensor width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Tensor height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved values, `height * width * 3` long.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the tensor, returning its values.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Subtracts the channel means and reorders RGB to BGR.
pub fn preprocess(image: RgbView<'_>, mean: &MeanSubtraction) -> InputTensor {
    let mut data = Vec::with_capacity(image.as_slice().len());
    for px in image.as_slice().chunks_exact(CHANNELS) {
        data.push(f32::from(px[2]) - mean.b);
        data.push(f32::from(px[1]) - mean.g);
        data.push(f32::from(px[0]) - mean.r);
    }
    InputTensor {
        data,
        width: image.width(),
        height: image.height(),
    }
}
