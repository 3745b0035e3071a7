use thiserror::Error;

/// The request payload could not be turned into a raster. Client-caused.
#[derive(Error, Debug)]
pub enum InvalidImageError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image data is too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to decode image: {0}")]
    Undecodable(#[from] image::ImageError),

    #[error("Image exceeds decoding limits: {0}")]
    LimitsExceeded(image::error::LimitError),

    #[error("Decoded image has a zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// The detection backend failed while processing a valid raster.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Detection backend failed: {0:#}")]
    Backend(anyhow::Error),

    #[error("Detection backend returned a non-finite value for detection {index}")]
    NonFiniteOutput { index: usize },
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    /// Short machine-friendly name, used as a metric attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidImage(_) => "invalid_image",
            PredictError::Inference(_) => "inference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = InvalidImageError::TooLarge { size: 20, max: 10 };
        assert_eq!(
            err.to_string(),
            "Image data is too large: 20 bytes (max: 10 bytes)"
        );

        let err = InvalidImageError::ZeroDimension {
            width: 0,
            height: 4,
        };
        assert_eq!(err.to_string(), "Decoded image has a zero dimension (0x4)");

        let err = InferenceError::Backend(
            anyhow::anyhow!("shape mismatch").context("running session"),
        );
        assert_eq!(
            err.to_string(),
            "Detection backend failed: running session: shape mismatch",
            "Backend errors should include the whole context chain"
        );
    }

    #[test]
    fn test_predict_error_is_transparent() {
        let err: PredictError = InvalidImageError::Empty.into();
        assert_eq!(err.to_string(), "Image payload is empty");
        assert_eq!(err.kind(), "invalid_image");

        let err: PredictError = InferenceError::NonFiniteOutput { index: 3 }.into();
        assert_eq!(err.kind(), "inference");
        assert!(matches!(
            err,
            PredictError::Inference(InferenceError::NonFiniteOutput { index: 3 })
        ));
    }
}
