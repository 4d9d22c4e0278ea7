// src/engine/plan.rs
//
// Shrink planning: split the total scale factor into an integer
// block-average stage and a fractional residual stage, and pick the
// interpolation kernel for the residual.

use crate::engine::decoder::SourceImage;
use crate::engine::orientation::Angle;
use crate::options::{Interpolator, Options};
use once_cell::sync::Lazy;
use tracing::debug;

/// Window size assumed before an interpolator has been chosen.
pub const DEFAULT_WINDOW_SIZE: u32 = 2;

/// The dimension whose ratio determined the overall shrink factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Result of shrink planning.
///
/// Invariant: `shrink >= 1` and `residual > 0`. The residual is the exact
/// remaining scale after the integer stage, so
/// `source_dim / shrink * residual ~= source_dim / factor` on the driving
/// axis, within integer-division error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShrinkPlan {
    pub shrink: u32,
    pub residual: f64,
    pub axis: Axis,
}

static TRACE_PLAN: Lazy<bool> = Lazy::new(|| std::env::var("THUMBKIT_TRACE_PLAN").is_ok());

/// Compute the shrink plan for a source image.
///
/// Effective dimensions swap when orientation correction is enabled and the
/// embedded orientation is 90/270, so planning happens in display space.
/// `interpolator` is `None` for the trial run that feeds kernel selection.
pub fn calculate_shrink(
    source: &SourceImage,
    options: &Options,
    interpolator: Option<Interpolator>,
) -> ShrinkPlan {
    let angle = Angle::from_metadata(source);
    let swap = options.rotate && angle.transposes();
    let width = if swap { source.height() } else { source.width() };
    let height = if swap { source.width() } else { source.height() };
    let window_size = interpolator.map_or(DEFAULT_WINDOW_SIZE, Interpolator::window_size);

    let plan = plan_dimensions(width, height, options, window_size);
    if *TRACE_PLAN {
        debug!(
            width,
            height,
            target_w = options.width,
            target_h = options.height,
            window_size,
            shrink = plan.shrink,
            residual = plan.residual,
            axis = ?plan.axis,
            "shrink plan"
        );
    }
    plan
}

/// Planning math on bare dimensions.
pub fn plan_dimensions(
    width: u32,
    height: u32,
    options: &Options,
    window_size: u32,
) -> ShrinkPlan {
    // Horizontal and vertical shrink needed to hit the target box. In crop
    // mode we aim to fill the box, so the smaller ratio drives and the other
    // axis overflows; in fit mode the larger ratio drives.
    let horizontal = width as f64 / options.width as f64;
    let vertical = height as f64 / options.height as f64;

    let axis = if options.crop {
        if horizontal < vertical {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    } else if horizontal < vertical {
        Axis::Vertical
    } else {
        Axis::Horizontal
    };

    let factor = match axis {
        Axis::Horizontal => horizontal,
        Axis::Vertical => vertical,
    };

    // A factor below 1.0 means zoom rather than shrink; the integer stage
    // never upscales.
    let factor2 = factor.max(1.0);

    // Integer component, shrinking by less for interpolators with larger
    // windows so the residual stage keeps enough support pixels.
    let shrink = ((factor2.floor() as u32) / (window_size / 2).max(1)).max(1);

    // Sources smaller than the target on both axes pass through unscaled
    // unless enlargement was requested.
    if options.without_enlargement && width < options.width && height < options.height {
        return ShrinkPlan {
            shrink: 1,
            residual: 1.0,
            axis,
        };
    }

    // Residual scale factor relative to the size the integer stage leaves.
    let driving = match axis {
        Axis::Horizontal => width,
        Axis::Vertical => height,
    };
    let after_integer = driving / shrink;
    let residual = (driving as f64 / factor) / after_integer as f64;

    ShrinkPlan {
        shrink,
        residual,
        axis,
    }
}

/// Choose the interpolation kernel from a trial plan run with the default
/// window. Net upscaling forces nearest-neighbor: smooth kernels magnify
/// into fuzzy, awful-looking thumbnails.
pub fn select_interpolator(source: &SourceImage, options: &Options) -> Interpolator {
    let trial = calculate_shrink(source, options, None);
    let selected = if trial.residual > 1.0 {
        Interpolator::Nearest
    } else {
        options.interpolator
    };
    debug!(
        residual = trial.residual,
        interpolator = selected.as_str(),
        "selected interpolator"
    );
    selected
}
