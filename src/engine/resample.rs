// src/engine/resample.rs
//
// The multi-stage resample: colorspace normalization, integer block-average
// shrink, anti-alias blur, fractional affine resample, sharpening, profile
// strip. Stage order and thresholds are load-bearing; the blur sigma is
// coupled to the residual scale and must not drift.

use crate::engine::decoder::{SourceImage, ICC_PROFILE_TAG};
use crate::engine::plan::{calculate_shrink, ShrinkPlan};
use crate::engine::sharpen;
use crate::error::{Result, ThumbError};
use crate::options::{Interpolator, Options};
use fast_image_resize::{self as fir, PixelType, ResizeOptions};
use image::{imageops, DynamicImage, Rgb, Rgb32FImage, RgbImage};
use tracing::{debug, info};

/// Working representation for the resample stages: 8-bit sRGB by default,
/// linear-light f32 when the request asks for linear processing.
enum Working {
    Srgb(RgbImage),
    Linear(Rgb32FImage),
}

impl Working {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Srgb(img) => img.dimensions(),
            Self::Linear(img) => img.dimensions(),
        }
    }
}

/// Run the full resample over a decoded source.
///
/// Consumes the input and returns a new image at (approximately, before
/// cropping) the target scale, with the color-profile tag removed.
pub fn resample(
    source: SourceImage,
    options: &Options,
    interpolator: Interpolator,
) -> Result<SourceImage> {
    let plan = calculate_shrink(&source, options, Some(interpolator));
    info!(
        shrink = plan.shrink,
        residual = plan.residual,
        interpolator = interpolator.as_str(),
        "integer shrink by {}",
        plan.shrink
    );

    let SourceImage { pixels, metadata } = source;
    let mut working = to_working(pixels, options.linear);

    // Fast, alias-resistant downscale by the whole-number factor. Averaging,
    // not subsampling.
    if plan.shrink > 1 {
        working = block_average(working, plan.shrink);
    }

    // If the final affine will be doing a large downsample, we can get nasty
    // aliasing on hard edges. Blur before affine to smooth this out. No blur
    // for very small shrinks; radius grows with the remaining shrink.
    let sigma = ((1.0 / plan.residual) - 0.5) / 1.5;
    if plan.residual < 1.0 && sigma > 0.1 {
        info!(sigma, "anti-alias blur before residual scale");
        working = gaussian_blur(working, sigma as f32);
    }

    // Precise fractional scale to the exact size, with the selected kernel.
    if (plan.residual - 1.0).abs() > f64::EPSILON {
        working = affine(working, plan.residual, interpolator)?;
        info!(residual = plan.residual, "residual scale applied");
    }

    // Upsampled output is never sharpened; nearest looks dumb sharpened.
    if plan.shrink >= 1 && plan.residual <= 1.0 {
        if let Some(mask) = options.sharpen {
            info!(mask = mask.as_str(), "sharpening thumbnail");
            working = match working {
                Working::Srgb(img) => Working::Srgb(sharpen::convolve_rgb8(&img, mask)),
                Working::Linear(img) => Working::Linear(sharpen::convolve_rgb32f(&img, mask)),
            };
        }
    }

    let mut result = SourceImage {
        pixels: into_srgb_dynamic(working),
        metadata,
    };

    // Color profiles are not propagated to thumbnails.
    if result.remove_tag(ICC_PROFILE_TAG) {
        debug!("deleted color profile from output image");
    }

    Ok(result)
}

/// Normalize to the RGB working colorspace, unpacking any packed or
/// companded encoding on the way.
fn to_working(pixels: DynamicImage, linear: bool) -> Working {
    if linear {
        let mut img = pixels.to_rgb32f();
        for sample in img.iter_mut() {
            *sample = srgb_to_linear(*sample);
        }
        Working::Linear(img)
    } else {
        match pixels {
            DynamicImage::ImageRgb8(img) => Working::Srgb(img),
            other => Working::Srgb(other.to_rgb8()),
        }
    }
}

/// Convert back to an 8-bit sRGB image for the downstream stages.
fn into_srgb_dynamic(working: Working) -> DynamicImage {
    match working {
        Working::Srgb(img) => DynamicImage::ImageRgb8(img),
        Working::Linear(mut img) => {
            for sample in img.iter_mut() {
                // Resampling overshoot can leave samples slightly outside
                // [0, 1]; clamp before the transfer function.
                *sample = linear_to_srgb((*sample).clamp(0.0, 1.0));
            }
            DynamicImage::ImageRgb32F(img).to_rgb8().into()
        }
    }
}

fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn block_average(working: Working, factor: u32) -> Working {
    match working {
        Working::Srgb(img) => Working::Srgb(block_average_rgb8(&img, factor)),
        Working::Linear(img) => Working::Linear(block_average_rgb32f(&img, factor)),
    }
}

/// Block-average shrink by a whole-number factor. Trailing rows/columns that
/// do not fill a whole block are averaged over the pixels that exist.
fn block_average_rgb8(src: &RgbImage, factor: u32) -> RgbImage {
    let (width, height) = src.dimensions();
    let out_w = (width / factor).max(1);
    let out_h = (height / factor).max(1);

    RgbImage::from_fn(out_w, out_h, |x, y| {
        let x0 = x * factor;
        let y0 = y * factor;
        let x1 = (x0 + factor).min(width);
        let y1 = (y0 + factor).min(height);
        let mut acc = [0u32; 3];
        for sy in y0..y1 {
            for sx in x0..x1 {
                let p = src.get_pixel(sx, sy);
                acc[0] += u32::from(p[0]);
                acc[1] += u32::from(p[1]);
                acc[2] += u32::from(p[2]);
            }
        }
        let count = (x1 - x0) * (y1 - y0);
        Rgb([
            ((acc[0] + count / 2) / count) as u8,
            ((acc[1] + count / 2) / count) as u8,
            ((acc[2] + count / 2) / count) as u8,
        ])
    })
}

fn block_average_rgb32f(src: &Rgb32FImage, factor: u32) -> Rgb32FImage {
    let (width, height) = src.dimensions();
    let out_w = (width / factor).max(1);
    let out_h = (height / factor).max(1);

    Rgb32FImage::from_fn(out_w, out_h, |x, y| {
        let x0 = x * factor;
        let y0 = y * factor;
        let x1 = (x0 + factor).min(width);
        let y1 = (y0 + factor).min(height);
        let mut acc = [0f32; 3];
        for sy in y0..y1 {
            for sx in x0..x1 {
                let p = src.get_pixel(sx, sy);
                acc[0] += p[0];
                acc[1] += p[1];
                acc[2] += p[2];
            }
        }
        let count = ((x1 - x0) * (y1 - y0)) as f32;
        Rgb([acc[0] / count, acc[1] / count, acc[2] / count])
    })
}

/// Separable Gaussian blur sized by the anti-alias sigma rule.
fn gaussian_blur(working: Working, sigma: f32) -> Working {
    match working {
        Working::Srgb(img) => Working::Srgb(imageops::blur(&img, sigma)),
        Working::Linear(img) => Working::Linear(imageops::blur(&img, sigma)),
    }
}

/// 2-D affine resample with the scale matrix (residual, 0, 0, residual).
fn affine(working: Working, residual: f64, interpolator: Interpolator) -> Result<Working> {
    let (width, height) = working.dimensions();
    let dst_w = ((width as f64 * residual).round() as u32).max(1);
    let dst_h = ((height as f64 * residual).round() as u32).max(1);

    match working {
        Working::Srgb(img) => {
            let resized = affine_rgb8(img, dst_w, dst_h, interpolator)
                .map_err(|message| ThumbError::resample_failed("affine", message))?;
            Ok(Working::Srgb(resized))
        }
        Working::Linear(img) => {
            // The SIMD path is 8-bit only; f32 buffers go through the
            // generic convolution resizer.
            let filter = image_filter_for(interpolator);
            Ok(Working::Linear(imageops::resize(&img, dst_w, dst_h, filter)))
        }
    }
}

/// SIMD resize of an 8-bit RGB buffer via fast_image_resize.
fn affine_rgb8(
    img: RgbImage,
    dst_width: u32,
    dst_height: u32,
    interpolator: Interpolator,
) -> std::result::Result<RgbImage, String> {
    let (src_width, src_height) = img.dimensions();
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err("invalid dimensions for resize".to_string());
    }

    let mut src_pixels = img.into_raw();
    let src_image = fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        PixelType::U8x3,
    )
    .map_err(|e| format!("fir source image error: {e:?}"))?;

    let mut dst_image = fir::images::Image::new(dst_width, dst_height, PixelType::U8x3);
    let options = ResizeOptions::new().resize_alg(resize_alg_for(interpolator));

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    RgbImage::from_raw(dst_width, dst_height, dst_image.into_vec())
        .ok_or_else(|| "failed to create rgb image from resized data".to_string())
}

fn resize_alg_for(interpolator: Interpolator) -> fir::ResizeAlg {
    match interpolator {
        Interpolator::Nearest => fir::ResizeAlg::Nearest,
        Interpolator::Bilinear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
        Interpolator::Bicubic => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
        Interpolator::Nohalo => fir::ResizeAlg::Convolution(fir::FilterType::Mitchell),
    }
}

fn image_filter_for(interpolator: Interpolator) -> imageops::FilterType {
    match interpolator {
        Interpolator::Nearest => imageops::FilterType::Nearest,
        Interpolator::Bilinear => imageops::FilterType::Triangle,
        Interpolator::Bicubic | Interpolator::Nohalo => imageops::FilterType::CatmullRom,
    }
}

/// Expected dimensions after the resample, used by tests and the crop stage
/// sanity checks.
pub fn resampled_dimensions(width: u32, height: u32, plan: &ShrinkPlan) -> (u32, u32) {
    let w = (width / plan.shrink).max(1);
    let h = (height / plan.shrink).max(1);
    if (plan.residual - 1.0).abs() > f64::EPSILON {
        (
            ((w as f64 * plan.residual).round() as u32).max(1),
            ((h as f64 * plan.residual).round() as u32).max(1),
        )
    } else {
        (w, h)
    }
}
