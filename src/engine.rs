// src/engine.rs
//
// The core of thumbkit: shrink planning, two-stage resampling, crop and
// orientation geometry, and the codec boundaries.
//
// This file is a facade that delegates to the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
/// This is the same limit used by libvips/sharp.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod api;
mod decoder;
mod encoder;
mod geometry;
mod orientation;
mod plan;
mod resample;
mod sharpen;

// Re-export commonly used types and functions
pub use api::{thumbnail, Thumbnail, Thumbnailer};
pub use decoder::{
    check_dimensions, decode, detect_format, InputFormat, SourceImage, ICC_PROFILE_TAG,
    MARKER_JPEG, MARKER_PNG, MARKER_WEBP, ORIENTATION_TAG,
};
pub use encoder::encode_jpeg;
pub use geometry::{crop_to_box, rotate_upright};
pub use orientation::Angle;
pub use plan::{
    calculate_shrink, plan_dimensions, select_interpolator, Axis, ShrinkPlan,
    DEFAULT_WINDOW_SIZE,
};
pub use resample::{resample, resampled_dimensions};
pub use sharpen::kernel as sharpen_kernel;
