// src/engine/sharpen.rs
//
// Optional sharpening stage. Some interpolators look a little soft, so the
// pipeline can run one fixed unsharp-style convolution after the residual
// scale. Edge taps clamp to the image border; the output must not grow a
// dark frame on thumbnails this small.

use crate::options::SharpenMask;
use image::{Rgb, Rgb32FImage, RgbImage};

/// The "mild" mask: 3x3 matrix with normalization scale 24.
const MILD_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 32.0, -1.0, -1.0, -1.0, -1.0];
const MILD_SCALE: f32 = 24.0;

/// Kernel taps relative to the center pixel, row-major.
const TAPS: [(i64, i64); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Kernel for a mask, pre-divided by its normalization scale so it can be
/// fed straight into a 3x3 convolution.
pub fn kernel(mask: SharpenMask) -> [f32; 9] {
    match mask {
        SharpenMask::Mild => {
            let mut k = MILD_KERNEL;
            for v in &mut k {
                *v /= MILD_SCALE;
            }
            k
        }
    }
}

pub fn convolve_rgb8(img: &RgbImage, mask: SharpenMask) -> RgbImage {
    let k = kernel(mask);
    let (width, height) = img.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0f32; 3];
        for (&kv, &(dx, dy)) in k.iter().zip(TAPS.iter()) {
            let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
            let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
            let p = img.get_pixel(sx, sy);
            acc[0] += kv * f32::from(p[0]);
            acc[1] += kv * f32::from(p[1]);
            acc[2] += kv * f32::from(p[2]);
        }
        Rgb([
            acc[0].round().clamp(0.0, 255.0) as u8,
            acc[1].round().clamp(0.0, 255.0) as u8,
            acc[2].round().clamp(0.0, 255.0) as u8,
        ])
    })
}

pub fn convolve_rgb32f(img: &Rgb32FImage, mask: SharpenMask) -> Rgb32FImage {
    let k = kernel(mask);
    let (width, height) = img.dimensions();
    Rgb32FImage::from_fn(width, height, |x, y| {
        let mut acc = [0f32; 3];
        for (&kv, &(dx, dy)) in k.iter().zip(TAPS.iter()) {
            let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
            let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
            let p = img.get_pixel(sx, sy);
            acc[0] += kv * p[0];
            acc[1] += kv * p[1];
            acc[2] += kv * p[2];
        }
        Rgb([
            acc[0].clamp(0.0, 1.0),
            acc[1].clamp(0.0, 1.0),
            acc[2].clamp(0.0, 1.0),
        ])
    })
}
