// src/engine/encoder.rs
//
// Encode boundary: JPEG via mozjpeg with quality, optimize_coding and
// optional progressive (interlace) output.

use crate::error::{Result, ThumbError};
use crate::options::Options;
use image::DynamicImage;
use mozjpeg::{ColorSpace, Compress};
use std::borrow::Cow;

use crate::engine::MAX_DIMENSION;

/// Encode the final image as JPEG.
///
/// `optimize_coding` is always on: thumbnails are encoded once and served
/// many times, so the extra entropy pass pays for itself.
pub fn encode_jpeg(img: &DynamicImage, options: &Options) -> Result<Vec<u8>> {
    let quality = options.quality.min(100);

    // Zero-copy when the pipeline already produced RGB8
    let rgb: Cow<'_, image::RgbImage> = match img {
        DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
        _ => Cow::Owned(img.to_rgb8()),
    };
    let (w, h) = rgb.dimensions();
    let pixels: &[u8] = rgb.as_raw();

    if w == 0 || h == 0 {
        return Err(ThumbError::encode_failed(
            "invalid image dimensions: width or height is zero",
        ));
    }
    if w > MAX_DIMENSION || h > MAX_DIMENSION {
        return Err(ThumbError::dimension_exceeds_limit(w.max(h), MAX_DIMENSION));
    }
    let expected_len = (w as usize) * (h as usize) * 3;
    if pixels.len() != expected_len {
        return Err(ThumbError::encode_failed("pixel buffer length mismatch"));
    }

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(w as usize, h as usize);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_quality(quality as f32);
    comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
    comp.set_optimize_coding(true);
    if options.interlace {
        comp.set_progressive_mode();
    }

    let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
    let mut output = Vec::with_capacity(estimated_size);

    let mut writer = comp
        .start_compress(&mut output)
        .map_err(|e| ThumbError::encode_failed(format!("mozjpeg: failed to start compress: {e:?}")))?;

    let stride = w as usize * 3;
    for row in pixels.chunks(stride) {
        writer.write_scanlines(row).map_err(|e| {
            ThumbError::encode_failed(format!("mozjpeg: failed to write scanlines: {e:?}"))
        })?;
    }

    writer
        .finish()
        .map_err(|e| ThumbError::encode_failed(format!("mozjpeg: failed to finish: {e:?}")))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_encode_produces_jpeg_marker() {
        let img = create_test_image(16, 16);
        let data = encode_jpeg(&img, &Options::new(16, 16)).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_1x1() {
        let img = create_test_image(1, 1);
        let data = encode_jpeg(&img, &Options::new(1, 1)).unwrap();
        assert!(!data.is_empty());
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_round_trip_dimensions() {
        let img = create_test_image(33, 17);
        let data = encode_jpeg(&img, &Options::new(33, 17)).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 17));
    }

    #[test]
    fn test_encode_interlaced() {
        let img = create_test_image(32, 32);
        let opts = Options {
            interlace: true,
            ..Options::new(32, 32)
        };
        let data = encode_jpeg(&img, &opts).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
        // Progressive JPEG carries an SOF2 marker instead of SOF0.
        assert!(data.windows(2).any(|pair| pair == [0xFF, 0xC2]));
    }

    #[test]
    fn test_encode_quality_affects_size() {
        let img = create_test_image(64, 64);
        let high = encode_jpeg(
            &img,
            &Options {
                quality: 95,
                ..Options::new(64, 64)
            },
        )
        .unwrap();
        let low = encode_jpeg(
            &img,
            &Options {
                quality: 20,
                ..Options::new(64, 64)
            },
        )
        .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_encode_converts_non_rgb_input() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(8, 8, image::Luma([42])));
        let data = encode_jpeg(&img, &Options::new(8, 8)).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }
}
