// src/error.rs
//
// Unified error handling for thumbkit
// Uses thiserror for simple, type-safe error handling

use std::borrow::Cow;
use thiserror::Error;

/// thumbkit error types
///
/// Every pipeline stage surfaces its failure as one of these variants and
/// the orchestrator short-circuits; no stage retries, since codec and
/// numeric failures are deterministic.
#[derive(Debug, Error)]
pub enum ThumbError {
    // Input Errors
    #[error("unrecognized image format (leading bytes {marker:02x?})")]
    UnrecognizedFormat { marker: [u8; 2] },

    #[error("invalid target box: {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    // Decode Errors
    #[error("failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Configuration Errors
    #[error("unknown sharpen mask: '{name}'. Available: mild")]
    UnsupportedSharpenMask { name: Cow<'static, str> },

    #[error("unknown interpolator: '{name}'. Available: nearest, bilinear, bicubic, nohalo")]
    UnsupportedInterpolator { name: Cow<'static, str> },

    // Stage Errors
    #[error("resample stage '{stage}' failed: {message}")]
    ResampleFailed {
        stage: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("crop failed: {message}")]
    CropFailed { message: Cow<'static, str> },

    #[error("rotate failed: {message}")]
    RotateFailed { message: Cow<'static, str> },

    // Encode Errors
    #[error("failed to encode as jpeg: {message}")]
    EncodeFailed { message: Cow<'static, str> },
}

// Constructor Helpers
impl ThumbError {
    pub fn unrecognized_format(marker: [u8; 2]) -> Self {
        Self::UnrecognizedFormat { marker }
    }

    pub fn invalid_target(width: u32, height: u32) -> Self {
        Self::InvalidTarget { width, height }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn unsupported_sharpen_mask(name: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedSharpenMask { name: name.into() }
    }

    pub fn unsupported_interpolator(name: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedInterpolator { name: name.into() }
    }

    pub fn resample_failed(
        stage: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResampleFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn crop_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::CropFailed {
            message: message.into(),
        }
    }

    pub fn rotate_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::RotateFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::EncodeFailed {
            message: message.into(),
        }
    }

    /// True when the error stems from the request configuration rather than
    /// the image bytes. Configuration errors are fixable by the caller.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidTarget { .. }
                | Self::UnsupportedSharpenMask { .. }
                | Self::UnsupportedInterpolator { .. }
        )
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, ThumbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ThumbError::unrecognized_format([0x00, 0x42]);
        assert!(err.to_string().contains("00"));
        assert!(err.to_string().contains("42"));

        let err = ThumbError::unsupported_sharpen_mask("aggressive");
        assert!(err.to_string().contains("aggressive"));

        let err = ThumbError::resample_failed("affine", "zero output");
        assert!(err.to_string().contains("affine"));
        assert!(err.to_string().contains("zero output"));
    }

    #[test]
    fn test_all_error_constructors() {
        let _ = ThumbError::unrecognized_format([0, 0]);
        let _ = ThumbError::invalid_target(0, 100);
        let _ = ThumbError::decode_failed("test");
        let _ = ThumbError::dimension_exceeds_limit(40000, 32768);
        let _ = ThumbError::pixel_count_exceeds_limit(1_000_000_000, 100_000_000);
        let _ = ThumbError::unsupported_sharpen_mask("x");
        let _ = ThumbError::unsupported_interpolator("lanczos9");
        let _ = ThumbError::resample_failed("shrink", "test");
        let _ = ThumbError::crop_failed("test");
        let _ = ThumbError::rotate_failed("test");
        let _ = ThumbError::encode_failed("test");
    }

    #[test]
    fn test_is_configuration() {
        assert!(ThumbError::invalid_target(0, 0).is_configuration());
        assert!(ThumbError::unsupported_sharpen_mask("x").is_configuration());
        assert!(ThumbError::unsupported_interpolator("x").is_configuration());
        assert!(!ThumbError::decode_failed("x").is_configuration());
        assert!(!ThumbError::encode_failed("x").is_configuration());
    }
}
