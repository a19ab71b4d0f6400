//! Frame encoders.

use std::sync::Arc;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage, RgbaImage};

use super::errors::{RecordingError, RecordingResult};

/// MIME type of the concatenated Motion-JPEG output.
pub const MJPEG_MIME_TYPE: &str = "video/x-motion-jpeg";

/// Turns frames into encoded chunks.
///
/// Chunks are buffered by the session and concatenated at stop, so the
/// output format must be valid as a plain concatenation.
pub trait FrameEncoder: Send {
    fn mime_type(&self) -> &str;

    /// Encode one frame. An empty chunk means nothing was produced.
    fn encode(&mut self, frame: &RgbaImage) -> RecordingResult<Vec<u8>>;

    /// Trailing data after the last frame.
    fn finish(&mut self) -> RecordingResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Builds a fresh encoder for each recording session.
pub type EncoderFactory = Arc<dyn Fn() -> Box<dyn FrameEncoder> + Send + Sync>;

/// Encodes every frame as a standalone JPEG.
#[derive(Debug, Clone)]
pub struct MjpegEncoder {
    quality: u8,
    frames: u64,
}

impl MjpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            frames: 0,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames
    }

    /// Factory producing encoders at `quality`.
    pub fn factory(quality: u8) -> EncoderFactory {
        Arc::new(move || Box::new(MjpegEncoder::new(quality)) as Box<dyn FrameEncoder>)
    }
}

impl Default for MjpegEncoder {
    fn default() -> Self {
        Self::new(80)
    }
}

impl FrameEncoder for MjpegEncoder {
    fn mime_type(&self) -> &str {
        MJPEG_MIME_TYPE
    }

    fn encode(&mut self, frame: &RgbaImage) -> RecordingResult<Vec<u8>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let rgb: RgbImage = frame.convert();
        let mut chunk = Vec::new();
        JpegEncoder::new_with_quality(&mut chunk, self.quality)
            .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| RecordingError::encode(e.to_string()))?;

        self.frames += 1;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_jpeg_chunks() {
        let mut encoder = MjpegEncoder::new(70);
        let chunk = encoder.encode(&RgbaImage::new(16, 8)).unwrap();
        // SOI marker
        assert_eq!(&chunk[..2], &[0xFF, 0xD8]);
        assert_eq!(encoder.frames_encoded(), 1);
        assert_eq!(encoder.mime_type(), MJPEG_MIME_TYPE);
        assert!(encoder.finish().unwrap().is_empty());
    }

    #[test]
    fn empty_frame_yields_empty_chunk() {
        let mut encoder = MjpegEncoder::default();
        assert!(encoder.encode(&RgbaImage::new(0, 10)).unwrap().is_empty());
        assert_eq!(encoder.frames_encoded(), 0);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(MjpegEncoder::new(0).quality(), 1);
        assert_eq!(MjpegEncoder::new(255).quality(), 100);
    }
}
