//! Raw camera frames.

use std::fmt;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::Result;

/// Monochrome frame, 16 bits per pixel, row-major.
///
/// The constructor does not validate dimensions against the buffer; consumers
/// such as the thumbnail encoder reject inconsistent frames instead.
#[derive(Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u16>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert any decoded image to 16-bit luminance
    pub fn from_image(image: DynamicImage) -> Self {
        let luma = image.into_luma16();
        let (width, height) = luma.dimensions();
        Self::new(width, height, luma.into_raw())
    }

    /// Decode a saved image file (TIFF, PNG, ...)
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_image(image::open(path)?))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }
}

/// Where the pixels for a report come from, if anywhere
#[derive(Debug, Clone, Default)]
pub enum FrameSource {
    /// No image data; no thumbnail is attempted
    #[default]
    None,
    /// Pixels already in memory
    Decoded(Frame),
    /// Image saved on disk, decoded when the report is built
    File(PathBuf),
}

impl FrameSource {
    /// Pick the in-memory frame if present, else the file path
    pub fn from_parts(frame: Option<Frame>, path: Option<PathBuf>) -> Self {
        match (frame, path) {
            (Some(frame), _) => FrameSource::Decoded(frame),
            (None, Some(path)) => FrameSource::File(path),
            (None, None) => FrameSource::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FrameSource::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    #[test]
    fn test_from_image_keeps_dimensions() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(4, 3, |x, y| Luma([(x * 1000 + y) as u16]));
        let frame = Frame::from_image(DynamicImage::ImageLuma16(img));

        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixels().len(), 12);
        assert_eq!(frame.pixels()[1], 1000);
    }

    #[test]
    fn test_frame_source_prefers_decoded() {
        let frame = Frame::new(1, 1, vec![0]);
        let source = FrameSource::from_parts(Some(frame), Some(PathBuf::from("/tmp/x.tif")));
        assert!(matches!(source, FrameSource::Decoded(_)));

        let source = FrameSource::from_parts(None, Some(PathBuf::from("/tmp/x.tif")));
        assert!(matches!(source, FrameSource::File(_)));

        assert!(FrameSource::from_parts(None, None).is_none());
    }
}
