use crate::errors::InvalidImageError;
use image::RgbImage;
use ndarray::{Array3, ArrayView3};

/// Decoded image as an (height, width, 3) array of RGB samples.
///
/// Both dimensions are always non-zero and the array is in standard
/// (row-major, contiguous) layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pixels: Array3<u8>,
}

impl Raster {
    pub const CHANNELS: usize = 3;

    /// Build a raster from packed RGB bytes in HWC order.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, InvalidImageError> {
        if width == 0 || height == 0 {
            return Err(InvalidImageError::ZeroDimension { width, height });
        }

        let expected = width as usize * height as usize * Self::CHANNELS;
        if data.len() != expected {
            return Err(InvalidImageError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let pixels = Array3::from_shape_vec((height as usize, width as usize, Self::CHANNELS), data)
            .map_err(|_| InvalidImageError::SizeMismatch {
                expected,
                actual: expected,
            })?;

        Ok(Self { pixels })
    }

    pub fn from_image(image: RgbImage) -> Result<Self, InvalidImageError> {
        let (width, height) = image.dimensions();
        Self::from_rgb(width, height, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.pixels.shape()[1] as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.shape()[0] as u32
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Packed RGB bytes in HWC order.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_slice().unwrap_or_default()
    }
}
