// src/engine/decoder.rs
//
// Decode boundary: magic-marker detection, codec routing (mozjpeg / zune-png
// / libwebp) and metadata tag extraction into a SourceImage.

use crate::error::{Result, ThumbError};
use exif;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use img_parts::{jpeg::Jpeg, png::Png, webp::WebP, ImageICC};
use mozjpeg::Decompress;
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::debug;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::bytestream::ZCursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

pub const MARKER_JPEG: [u8; 2] = [0xFF, 0xD8];
pub const MARKER_PNG: [u8; 2] = [0x89, 0x50];
pub const MARKER_WEBP: [u8; 2] = [0x52, 0x49];

/// Metadata tag carrying the EXIF orientation value as a decimal string.
pub const ORIENTATION_TAG: &str = "exif-ifd0-Orientation";
/// Metadata tag marking an embedded ICC profile (value is the profile size).
pub const ICC_PROFILE_TAG: &str = "icc-profile-data";

/// Supported input containers, detected from the leading two bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Jpeg,
    Png,
    WebP,
}

/// A decoded image plus its surviving metadata tags.
///
/// Ownership is linear: every pipeline stage consumes the SourceImage it is
/// given and produces a new one, so intermediates are never shared.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    pub metadata: BTreeMap<String, String>,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            metadata: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    pub fn set_tag(&mut self, name: &str, value: impl Into<String>) {
        self.metadata.insert(name.to_string(), value.into());
    }

    pub fn remove_tag(&mut self, name: &str) -> bool {
        self.metadata.remove(name).is_some()
    }

    /// Replace the pixel buffer, keeping the metadata tags.
    pub fn with_pixels(self, pixels: DynamicImage) -> Self {
        Self {
            pixels,
            metadata: self.metadata,
        }
    }
}

/// Match the leading two bytes against the known magic markers.
/// An unrecognized marker fails fast; nothing is ever decoded on a guess.
pub fn detect_format(bytes: &[u8]) -> Result<InputFormat> {
    if bytes.len() < 2 {
        return Err(ThumbError::unrecognized_format([0, 0]));
    }
    let marker = [bytes[0], bytes[1]];
    match marker {
        MARKER_JPEG => Ok(InputFormat::Jpeg),
        MARKER_PNG => Ok(InputFormat::Png),
        MARKER_WEBP => Ok(InputFormat::WebP),
        other => Err(ThumbError::unrecognized_format(other)),
    }
}

/// Decode the buffer with the codec selected by `detect_format` and attach
/// the orientation / ICC metadata tags.
pub fn decode(bytes: &[u8]) -> Result<SourceImage> {
    let format = detect_format(bytes)?;
    let pixels = match format {
        InputFormat::Jpeg => decode_jpeg_mozjpeg(bytes)?,
        InputFormat::Png => decode_png_zune(bytes)?,
        InputFormat::WebP => decode_webp_libwebp(bytes)?,
    };

    let mut source = SourceImage::new(pixels);
    if let Some(orientation) = detect_exif_orientation(bytes) {
        source.set_tag(ORIENTATION_TAG, orientation.to_string());
    }
    if let Some(icc) = extract_icc_profile(bytes, format) {
        source.set_tag(ICC_PROFILE_TAG, icc.len().to_string());
    }
    debug!(
        ?format,
        width = source.width(),
        height = source.height(),
        tags = source.metadata.len(),
        "decoded source image"
    );
    Ok(source)
}

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo).
/// This is significantly faster than the image crate's pure Rust decoder.
fn decode_jpeg_mozjpeg(data: &[u8]) -> Result<DynamicImage> {
    if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
        return Err(ThumbError::decode_failed("mozjpeg: missing JPEG EOI marker"));
    }

    let decompress = Decompress::new_mem(data)
        .map_err(|e| ThumbError::decode_failed(format!("mozjpeg decompress init failed: {e:?}")))?;

    let mut decompress = decompress
        .rgb()
        .map_err(|e| ThumbError::decode_failed(format!("mozjpeg rgb conversion failed: {e:?}")))?;

    let width = decompress.width();
    let height = decompress.height();
    if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
        return Err(ThumbError::dimension_exceeds_limit(
            width.max(height) as u32,
            MAX_DIMENSION,
        ));
    }
    let width_u32 = width as u32;
    let height_u32 = height as u32;
    check_dimensions(width_u32, height_u32)?;

    let pixels: Vec<[u8; 3]> = decompress
        .read_scanlines()
        .map_err(|e| ThumbError::decode_failed(format!("mozjpeg: failed to read scanlines: {e:?}")))?;

    let flat_pixels: Vec<u8> = pixels.into_iter().flatten().collect();

    let rgb_image = RgbImage::from_raw(width_u32, height_u32, flat_pixels)
        .ok_or_else(|| ThumbError::decode_failed("mozjpeg: failed to create image from raw data"))?;

    Ok(DynamicImage::ImageRgb8(rgb_image))
}

/// Decode PNG using zune-png. 16-bit input is stripped to 8-bit.
fn decode_png_zune(data: &[u8]) -> Result<DynamicImage> {
    let options = DecoderOptions::default().png_set_strip_to_8bit(true);
    let mut decoder = PngDecoder::new_with_options(ZCursor::new(data), options);
    let pixels = decoder
        .decode()
        .map_err(|e| ThumbError::decode_failed(format!("png: decode failed: {e}")))?;

    let (info_width, info_height) = decoder
        .dimensions()
        .ok_or_else(|| ThumbError::decode_failed("png: missing header info"))?;

    let width = info_width as u32;
    let height = info_height as u32;
    check_dimensions(width, height)?;

    let buf = match pixels {
        zune_core::result::DecodingResult::U8(v) => v,
        _ => {
            return Err(ThumbError::decode_failed(
                "png: unexpected non-U8 pixel buffer",
            ))
        }
    };

    let colorspace = decoder
        .colorspace()
        .ok_or_else(|| ThumbError::decode_failed("png: missing colorspace"))?;

    let img = match colorspace {
        ColorSpace::RGB => RgbImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ThumbError::decode_failed("png: failed to build RGB image"))?,
        ColorSpace::RGBA | ColorSpace::YCbCr | ColorSpace::BGRA | ColorSpace::ARGB => {
            RgbaImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| ThumbError::decode_failed("png: failed to build RGBA image"))?
        }
        ColorSpace::Luma => GrayImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| ThumbError::decode_failed("png: failed to build Luma image"))?,
        ColorSpace::LumaA => GrayAlphaImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageLumaA8)
            .ok_or_else(|| ThumbError::decode_failed("png: failed to build LumaA image"))?,
        other => {
            return Err(ThumbError::decode_failed(format!(
                "png: unsupported colorspace {:?}",
                other
            )))
        }
    };

    Ok(img)
}

/// Decode WebP using libwebp (via webp crate). Falls back to the image crate
/// for animated WebP, which the simple decoder does not support.
fn decode_webp_libwebp(data: &[u8]) -> Result<DynamicImage> {
    let features = BitstreamFeatures::new(data)
        .ok_or_else(|| ThumbError::decode_failed("webp: failed to read bitstream features"))?;

    if features.has_animation() {
        return image::load_from_memory(data)
            .map_err(|e| ThumbError::decode_failed(format!("webp (animated) decode failed: {e}")));
    }

    check_dimensions(features.width(), features.height())?;

    let decoder = WebPDecoder::new(data);
    let decoded = decoder
        .decode()
        .ok_or_else(|| ThumbError::decode_failed("webp: decode failed"))?;

    // Defensive: ensure actual decoded size is also within limits
    check_dimensions(decoded.width(), decoded.height())?;

    Ok(decoded.to_image())
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ThumbError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(ThumbError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Extract EXIF Orientation tag (1-8). Returns None if missing or invalid.
pub fn detect_exif_orientation(bytes: &[u8]) -> Option<u16> {
    let mut cursor = Cursor::new(bytes);
    let exif_reader = exif::Reader::new();
    let exif = exif_reader.read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    // exif crate can represent as Short/Long; use get_uint for safety
    let value = field.value.get_uint(0)?;
    let orientation = value as u16;
    if (1..=8).contains(&orientation) {
        Some(orientation)
    } else {
        None
    }
}

/// Extract the embedded ICC profile, if any.
fn extract_icc_profile(data: &[u8], format: InputFormat) -> Option<Vec<u8>> {
    match format {
        InputFormat::Jpeg => {
            let jpeg = Jpeg::from_bytes(data.to_vec().into()).ok()?;
            jpeg.icc_profile().map(|icc| icc.to_vec())
        }
        InputFormat::Png => {
            let png = Png::from_bytes(data.to_vec().into()).ok()?;
            png.icc_profile().map(|icc| icc.to_vec())
        }
        InputFormat::WebP => {
            let webp = WebP::from_bytes(data.to_vec().into()).ok()?;
            webp.icc_profile().map(|icc| icc.to_vec())
        }
    }
}
