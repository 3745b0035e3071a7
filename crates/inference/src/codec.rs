//! Base64 image payload decoding and validation.

use crate::errors::InvalidImageError;
use crate::raster::Raster;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use common::span_debug;
use image::{ImageError, ImageReader, Limits};
use std::io::Cursor;

/// Maximum decoded image size (10MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum width or height of a decoded image, in pixels
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 8192;

/// Maximum memory the image codec may allocate for one decode (256MB)
pub const DEFAULT_MAX_DECODED_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ImageDecoder {
    max_image_bytes: usize,
    max_image_dimension: u32,
    max_decoded_bytes: u64,
}

impl ImageDecoder {
    pub fn new(max_image_bytes: usize) -> Self {
        Self {
            max_image_bytes,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
        }
    }

    pub fn with_max_dimension(mut self, max_image_dimension: u32) -> Self {
        self.max_image_dimension = max_image_dimension;
        self
    }

    pub fn with_max_decoded_bytes(mut self, max_decoded_bytes: u64) -> Self {
        self.max_decoded_bytes = max_decoded_bytes;
        self
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_image_dimension);
        limits.max_image_height = Some(self.max_image_dimension);
        limits.max_alloc = Some(self.max_decoded_bytes);
        limits
    }

    /// Decode a base64-encoded PNG/JPEG payload into an RGB raster.
    ///
    /// Accepts a bare base64 string or a `data:<mime>;base64,` URL. The image
    /// header is checked against the dimension and allocation limits before
    /// any pixel buffer is allocated.
    pub fn decode(&self, encoded: &str) -> Result<Raster, InvalidImageError> {
        let _s = span_debug!("decode_image");

        let payload = strip_data_url(encoded.trim());
        if payload.is_empty() {
            return Err(InvalidImageError::Empty);
        }

        // Reject before allocating when even the lower bound is too big
        let estimate = base64::decoded_len_estimate(payload.len()).saturating_sub(2);
        if estimate > self.max_image_bytes {
            return Err(InvalidImageError::TooLarge {
                size: estimate,
                max: self.max_image_bytes,
            });
        }

        let bytes = STANDARD.decode(payload)?;

        if bytes.is_empty() {
            return Err(InvalidImageError::Empty);
        }

        if bytes.len() > self.max_image_bytes {
            return Err(InvalidImageError::TooLarge {
                size: bytes.len(),
                max: self.max_image_bytes,
            });
        }

        let mut reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(ImageError::from)?;
        reader.limits(self.limits());

        let image = reader.decode().map_err(|e| match e {
            ImageError::Limits(limit) => InvalidImageError::LimitsExceeded(limit),
            other => InvalidImageError::Undecodable(other),
        })?;

        tracing::trace!(
            width = image.width(),
            height = image.height(),
            encoded_bytes = bytes.len(),
            "Decoded image payload"
        );

        if image.width() == 0 || image.height() == 0 {
            return Err(InvalidImageError::ZeroDimension {
                width: image.width(),
                height: image.height(),
            });
        }

        Raster::from_image(image.into_rgb8())
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

/// Decode with the default size limit.
pub fn decode(encoded: &str) -> Result<Raster, InvalidImageError> {
    ImageDecoder::default().decode(encoded)
}

fn strip_data_url(payload: &str) -> &str {
    payload
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map_or(payload, |(_, data)| data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    pub(crate) fn encode_solid_image(
        width: u32,
        height: u32,
        color: [u8; 3],
        format: ImageFormat,
    ) -> String {
        let image = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    #[test]
    fn test_decode_png() {
        let encoded = encode_solid_image(100, 50, [10, 20, 30], ImageFormat::Png);
        let raster = decode(&encoded).unwrap();

        assert_eq!(raster.width(), 100);
        assert_eq!(raster.height(), 50);
        assert_eq!(raster.view()[[25, 50, 0]], 10);
        assert_eq!(raster.view()[[25, 50, 1]], 20);
        assert_eq!(raster.view()[[25, 50, 2]], 30);
    }

    #[test]
    fn test_decode_jpeg() {
        let encoded = encode_solid_image(64, 48, [128, 128, 128], ImageFormat::Jpeg);
        let raster = decode(&encoded).unwrap();

        assert_eq!(raster.width(), 64);
        assert_eq!(raster.height(), 48);
        // JPEG is lossy, solid gray should stay close
        let sample = raster.view()[[24, 32, 1]] as i32;
        assert!((sample - 128).abs() <= 3, "got {}", sample);
    }

    #[test]
    fn test_decode_data_url() {
        let encoded = encode_solid_image(8, 8, [0, 0, 0], ImageFormat::Png);
        let url = format!("data:image/png;base64,{}", encoded);
        let raster = decode(&url).unwrap();
        assert_eq!((raster.width(), raster.height()), (8, 8));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let encoded = encode_solid_image(3, 3, [1, 2, 3], ImageFormat::Png);
        let raster = decode(&format!("  {}\n", encoded)).unwrap();
        assert_eq!(raster.width(), 3);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = decode("not-base64!!").unwrap_err();
        assert!(matches!(err, InvalidImageError::InvalidBase64(_)));
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(decode("").unwrap_err(), InvalidImageError::Empty));
        assert!(matches!(
            decode("   ").unwrap_err(),
            InvalidImageError::Empty
        ));
        assert!(matches!(
            decode("data:image/png;base64,").unwrap_err(),
            InvalidImageError::Empty
        ));
    }

    #[test]
    fn test_non_image_bytes_rejected() {
        let encoded = STANDARD.encode(b"hello world, definitely not a png");
        let err = decode(&encoded).unwrap_err();
        assert!(matches!(err, InvalidImageError::Undecodable(_)));
    }

    #[test]
    fn test_truncated_png_rejected() {
        let encoded = encode_solid_image(32, 32, [255, 0, 0], ImageFormat::Png);
        let bytes = STANDARD.decode(encoded).unwrap();
        let truncated = STANDARD.encode(&bytes[..bytes.len() / 2]);

        let err = decode(&truncated).unwrap_err();
        assert!(matches!(err, InvalidImageError::Undecodable(_)));
    }

    #[test]
    fn test_size_limit_enforced() {
        let encoded = encode_solid_image(16, 16, [9, 9, 9], ImageFormat::Png);
        let decoded_len = STANDARD.decode(&encoded).unwrap().len();

        let err = ImageDecoder::new(decoded_len - 1)
            .decode(&encoded)
            .unwrap_err();
        assert!(matches!(err, InvalidImageError::TooLarge { .. }));

        assert!(ImageDecoder::new(decoded_len).decode(&encoded).is_ok());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        // Tiny payload, but wider than the default limit
        let encoded = encode_solid_image(
            DEFAULT_MAX_IMAGE_DIMENSION + 1,
            1,
            [0, 0, 0],
            ImageFormat::Png,
        );
        assert!(STANDARD.decode(&encoded).unwrap().len() < 64 * 1024);

        let err = decode(&encoded).unwrap_err();
        assert!(matches!(err, InvalidImageError::LimitsExceeded(_)), "got {:?}", err);
    }

    #[test]
    fn test_dimension_limit_applies_per_axis() {
        let decoder = ImageDecoder::default().with_max_dimension(64);

        let tall = encode_solid_image(8, 65, [1, 1, 1], ImageFormat::Png);
        assert!(matches!(
            decoder.decode(&tall).unwrap_err(),
            InvalidImageError::LimitsExceeded(_)
        ));

        let fits = encode_solid_image(64, 64, [1, 1, 1], ImageFormat::Png);
        assert!(decoder.decode(&fits).is_ok());
    }

    #[test]
    fn test_allocation_limit_enforced() {
        // 100x100 RGB needs 30000 bytes
        let decoder = ImageDecoder::default().with_max_decoded_bytes(10_000);
        let encoded = encode_solid_image(100, 100, [5, 5, 5], ImageFormat::Png);

        let err = decoder.decode(&encoded).unwrap_err();
        assert!(matches!(err, InvalidImageError::LimitsExceeded(_)), "got {:?}", err);
    }

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url("AAAA"), "AAAA");
        // Not base64-typed: leave as is so base64 decoding reports it
        assert_eq!(strip_data_url("data:text/plain,hi"), "data:text/plain,hi");
    }
}
