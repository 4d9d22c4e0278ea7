// src/engine/geometry.rs
//
// Final geometry: crop/pad to the exact target box, then orientation-aware
// rotation.

use crate::engine::decoder::{SourceImage, ORIENTATION_TAG};
use crate::engine::orientation::Angle;
use crate::error::Result;
use crate::options::Options;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

/// Crop (or pad) the resampled image to the exact target box.
///
/// No-op when the image already matches the target, and in fit mode, where
/// the resampled dimensions are accepted as-is. In fill mode the crop
/// window is centered; `(W - w) / 2` uses truncating division, and a
/// negative offset means the image falls short on that axis and gets padded
/// with the extend color instead.
pub fn crop_to_box(source: SourceImage, options: &Options) -> Result<SourceImage> {
    // The crop happens in physical space before the rotation stage; when a
    // 90/270 rotation is pending, the box transposes so the rotated result
    // lands exactly on the target.
    let angle = Angle::from_metadata(&source);
    let (box_w, box_h) = if options.rotate && angle.transposes() {
        (options.height, options.width)
    } else {
        (options.width, options.height)
    };

    let (width, height) = (source.width(), source.height());
    if width == box_w && height == box_h {
        return Ok(source);
    }
    if !options.crop {
        return Ok(source);
    }

    let left = (width as i64 - box_w as i64) / 2;
    let top = (height as i64 - box_h as i64) / 2;
    debug!(left, top, box_w, box_h, "cropping");

    let rgb = match &source.pixels {
        DynamicImage::ImageRgb8(img) => img.clone(),
        other => other.to_rgb8(),
    };
    let fill = Rgb(options.extend.fill_u8());

    let out = RgbImage::from_fn(box_w, box_h, |x, y| {
        let sx = left + x as i64;
        let sy = top + y as i64;
        if sx >= 0 && sy >= 0 && (sx as u32) < width && (sy as u32) < height {
            *rgb.get_pixel(sx as u32, sy as u32)
        } else {
            fill
        }
    });

    Ok(source.with_pixels(DynamicImage::ImageRgb8(out)))
}

/// Rotate the image upright when orientation correction is enabled, then
/// clear the orientation tag so downstream consumers do not rotate again.
/// With correction disabled the image and tag pass through untouched.
pub fn rotate_upright(mut source: SourceImage, options: &Options) -> Result<SourceImage> {
    if !options.rotate {
        return Ok(source);
    }
    let angle = Angle::from_metadata(&source);
    if angle == Angle::D0 {
        return Ok(source);
    }

    debug!(degrees = angle.degrees(), "rotating upright");
    // Rotation needs random access; the buffer is fully materialized here,
    // unlike the streaming-friendly stages before it.
    source.pixels = match angle {
        Angle::D90 => source.pixels.rotate90(),
        Angle::D180 => source.pixels.rotate180(),
        Angle::D270 => source.pixels.rotate270(),
        Angle::D0 => unreachable!(),
    };
    source.remove_tag(ORIENTATION_TAG);
    Ok(source)
}
