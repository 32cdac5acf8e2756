//! JPEG previews of raw frames.
//!
//! The frame is resized to [`THUMBNAIL_WIDTH`] pixels wide, keeping its
//! aspect ratio, linearly stretched between its darkest and brightest pixel
//! so faint 16-bit data stays visible, and encoded at [`JPEG_QUALITY`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};

use crate::capture::Frame;
use crate::error::{Error, Result};

/// Output width in pixels
pub const THUMBNAIL_WIDTH: u32 = 300;

/// JPEG quality, 1-100
pub const JPEG_QUALITY: u8 = 70;

// JPEG cannot encode dimensions above this.
const MAX_JPEG_DIMENSION: u64 = u16::MAX as u64;

/// Encode `frame` as a base64 JPEG thumbnail.
///
/// Returns an error (never panics) for empty frames or frames whose pixel
/// buffer does not match their dimensions.
pub fn encode_thumbnail(frame: &Frame) -> Result<String> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(Error::Thumbnail(format!(
            "frame has zero dimension ({}x{})",
            width, height
        )));
    }

    let expected = u64::from(width) * u64::from(height);
    if frame.pixels().len() as u64 != expected {
        return Err(Error::Thumbnail(format!(
            "frame is {}x{} but has {} pixels",
            width,
            height,
            frame.pixels().len()
        )));
    }

    let thumb_height = scaled_height(width, height);
    if u64::from(thumb_height) > MAX_JPEG_DIMENSION {
        return Err(Error::Thumbnail(format!(
            "thumbnail would be {} pixels tall",
            thumb_height
        )));
    }

    let source: ImageBuffer<Luma<u16>, &[u16]> =
        ImageBuffer::from_raw(width, height, frame.pixels())
            .ok_or_else(|| Error::Thumbnail("pixel buffer too small".to_string()))?;

    let resized = imageops::resize(&source, THUMBNAIL_WIDTH, thumb_height, FilterType::Triangle);
    let preview = stretch_to_8bit(&resized);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&preview)?;

    Ok(STANDARD.encode(jpeg))
}

/// Height that keeps the aspect ratio at [`THUMBNAIL_WIDTH`], at least 1
fn scaled_height(width: u32, height: u32) -> u32 {
    let scaled = (f64::from(height) * f64::from(THUMBNAIL_WIDTH) / f64::from(width)).round();
    (scaled as u32).max(1)
}

fn stretch_to_8bit(image: &ImageBuffer<Luma<u16>, Vec<u16>>) -> GrayImage {
    let (min, max) = image
        .as_raw()
        .iter()
        .fold((u16::MAX, u16::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    let range = u32::from(max.saturating_sub(min)).max(1);

    let pixels = image
        .as_raw()
        .iter()
        .map(|&p| ((u32::from(p.saturating_sub(min)) * 255) / range) as u8)
        .collect();

    // Same dimensions, one byte per pixel: cannot fail.
    GrayImage::from_raw(image.width(), image.height(), pixels).unwrap_or_default()
}
