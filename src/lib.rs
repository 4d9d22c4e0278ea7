// lib.rs
//
// thumbkit: a high-quality thumbnail engine.
//
// Design goals:
// - Exact target geometry: fill crops, fit preserves aspect
// - Two-stage resampling: fast block-average shrink, precise residual scale
// - Aliasing-aware blur and optional sharpening tied to the shrink math
// - Orientation-corrected output with the EXIF tag cleared

pub mod engine;
pub mod error;
pub mod options;

pub use engine::{thumbnail, SourceImage, Thumbnail, Thumbnailer};
pub use error::{Result, ThumbError};
pub use options::{Extend, Interpolator, Options, SharpenMask};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use tracing::debug;

// =============================================================================
// LIFECYCLE
// =============================================================================

static INIT: Once = Once::new();
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// One-time library initialization. Thread-safe and idempotent; the first
/// render calls it lazily, callers that want deterministic startup cost can
/// call it explicitly.
pub fn initialize() {
    INIT.call_once(|| {
        INITIALIZED.store(true, Ordering::Release);
        debug!(version = version(), "thumbkit initialized");
    });
}

/// Mark the library as shut down. Intermediate buffers are scope-owned per
/// run, so there is nothing to tear down beyond the flag; this exists as an
/// explicit lifecycle call for hosts that manage engine state at exit.
pub fn shutdown() {
    INITIALIZED.store(false, Ordering::Release);
}

/// Whether `initialize` has run and `shutdown` has not been called since.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Get library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get supported input formats
pub fn supported_input_formats() -> Vec<String> {
    vec![
        "jpeg".to_string(),
        "jpg".to_string(),
        "png".to_string(),
        "webp".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        initialize();
        assert!(is_initialized());
        initialize();
        assert!(is_initialized());
    }

    #[test]
    fn test_version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_supported_input_formats() {
        let formats = supported_input_formats();
        assert!(formats.contains(&"jpeg".to_string()));
        assert!(formats.contains(&"webp".to_string()));
    }
}
