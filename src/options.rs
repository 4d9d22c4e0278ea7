// src/options.rs
//
// Typed request configuration.
// String-keyed option bags are rejected at construction time; the pipeline
// only ever sees closed enums.

use crate::error::{Result, ThumbError};
use tracing::warn;

/// Interpolation kernel for the fractional residual stage.
///
/// `window_size` is the pixel-support width of the kernel; larger windows
/// bias the planner toward a smaller integer pre-shrink so the precise
/// stage has enough source pixels to work with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolator {
    /// Nearest-neighbor. Only ever selected for upscaling.
    Nearest,
    Bilinear,
    Bicubic,
    /// Halo-suppressing cubic.
    Nohalo,
}

impl Interpolator {
    /// Kernel support window in pixels.
    pub fn window_size(self) -> u32 {
        match self {
            Self::Nearest => 1,
            Self::Bilinear => 2,
            Self::Bicubic | Self::Nohalo => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Nohalo => "nohalo",
        }
    }

    /// Parse an interpolator name. Unknown names are a configuration error.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            "nohalo" => Ok(Self::Nohalo),
            other => Err(ThumbError::unsupported_interpolator(other.to_string())),
        }
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::Bicubic
    }
}

/// Sharpening convolution mask, selected by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharpenMask {
    Mild,
}

impl SharpenMask {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
        }
    }

    /// Parse a mask name. Unknown names are a configuration error.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "mild" => Ok(Self::Mild),
            other => Err(ThumbError::unsupported_sharpen_mask(other.to_string())),
        }
    }
}

/// Edge-extend policy used when padding a cropped image that falls short of
/// the target box on some axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extend {
    Black,
    White,
}

impl Extend {
    pub(crate) fn fill_u8(self) -> [u8; 3] {
        match self {
            Self::Black => [0, 0, 0],
            Self::White => [255, 255, 255],
        }
    }
}

impl Default for Extend {
    fn default() -> Self {
        Self::Black
    }
}

/// One thumbnail request. Immutable for the duration of a pipeline run.
#[derive(Clone, Debug)]
pub struct Options {
    /// Target box width in pixels.
    pub width: u32,
    /// Target box height in pixels.
    pub height: u32,
    /// JPEG quality 1-100. 0 means "unset" and normalizes to 95.
    pub quality: u8,
    /// Fill mode: overflow the box on the non-driving axis and crop.
    /// When false (fit mode), the whole image fits inside the box.
    pub crop: bool,
    /// Correct EXIF orientation by rotating the output upright.
    pub rotate: bool,
    /// Refuse to upscale sources smaller than the target on both axes.
    pub without_enlargement: bool,
    /// Process in linear light instead of companded sRGB.
    pub linear: bool,
    /// Emit progressive (interlaced) JPEG.
    pub interlace: bool,
    /// Drop all metadata tags from the result.
    pub strip: bool,
    pub extend: Extend,
    pub interpolator: Interpolator,
    /// Optional sharpening pass; `None` disables it.
    pub sharpen: Option<SharpenMask>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            quality: 95,
            crop: false,
            rotate: false,
            without_enlargement: false,
            linear: false,
            interlace: false,
            strip: false,
            extend: Extend::Black,
            interpolator: Interpolator::Bicubic,
            sharpen: Some(SharpenMask::Mild),
        }
    }
}

impl Options {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Apply defaults for values the caller left unset and validate the
    /// target box. Runs once, before the pipeline starts.
    pub fn normalize(mut self) -> Result<Self> {
        if self.quality == 0 {
            self.quality = 95;
        }
        self.quality = self.quality.min(100);
        if self.width == 0 || self.height == 0 {
            return Err(ThumbError::invalid_target(self.width, self.height));
        }
        Ok(self)
    }

    /// Select the sharpen mask by name, downgrading unknown names to a
    /// warning. Sharpening is a quality enhancement, not a correctness
    /// requirement, so a bad name disables it instead of failing the run.
    pub fn sharpen_by_name(mut self, name: &str) -> Self {
        self.sharpen = match SharpenMask::parse(name) {
            Ok(mask) => Some(mask),
            Err(_) => {
                warn!(mask = name, "unknown sharpen mask, disabling sharpening");
                None
            }
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolator_parse_round_trip() {
        for interp in [
            Interpolator::Nearest,
            Interpolator::Bilinear,
            Interpolator::Bicubic,
            Interpolator::Nohalo,
        ] {
            assert_eq!(Interpolator::parse(interp.as_str()).unwrap(), interp);
        }
    }

    #[test]
    fn test_interpolator_unknown_name_is_config_error() {
        let err = Interpolator::parse("lanczos9").unwrap_err();
        assert!(matches!(err, ThumbError::UnsupportedInterpolator { .. }));
    }

    #[test]
    fn test_interpolator_window_sizes() {
        assert_eq!(Interpolator::Nearest.window_size(), 1);
        assert_eq!(Interpolator::Bilinear.window_size(), 2);
        assert_eq!(Interpolator::Bicubic.window_size(), 4);
        assert_eq!(Interpolator::Nohalo.window_size(), 4);
    }

    #[test]
    fn test_sharpen_mask_parse() {
        assert_eq!(SharpenMask::parse("mild").unwrap(), SharpenMask::Mild);
        let err = SharpenMask::parse("aggressive").unwrap_err();
        assert!(matches!(err, ThumbError::UnsupportedSharpenMask { .. }));
    }

    #[test]
    fn test_defaults() {
        let opts = Options::new(200, 200);
        assert_eq!(opts.quality, 95);
        assert_eq!(opts.interpolator, Interpolator::Bicubic);
        assert_eq!(opts.sharpen, Some(SharpenMask::Mild));
        assert_eq!(opts.extend, Extend::Black);
        assert!(!opts.crop);
        assert!(!opts.without_enlargement);
    }

    #[test]
    fn test_normalize_unset_quality() {
        let opts = Options {
            quality: 0,
            ..Options::new(100, 100)
        };
        assert_eq!(opts.normalize().unwrap().quality, 95);
    }

    #[test]
    fn test_normalize_clamps_quality() {
        let opts = Options {
            quality: 255,
            ..Options::new(100, 100)
        };
        assert_eq!(opts.normalize().unwrap().quality, 100);
    }

    #[test]
    fn test_normalize_rejects_zero_target() {
        assert!(Options::new(0, 100).normalize().is_err());
        assert!(Options::new(100, 0).normalize().is_err());
    }

    #[test]
    fn test_sharpen_by_name_lenient() {
        let opts = Options::new(10, 10).sharpen_by_name("mild");
        assert_eq!(opts.sharpen, Some(SharpenMask::Mild));
        let opts = Options::new(10, 10).sharpen_by_name("gaussian");
        assert_eq!(opts.sharpen, None);
    }
}
