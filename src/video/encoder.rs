/*!
 * Frame Encoder Module
 *
 * Turns grabbed frames into the payload of one AVI frame chunk:
 * a bottom-up BGR DIB for raw recordings, a JPEG image for MJPEG.
 */

use anyhow::{bail, Context, Result};
use tracing::info;

use super::frame::RawFrame;
use super::VideoCodec;

/// Frame encoder trait
pub trait FrameEncoder: Send {
    /// Encode `frame` into `out` (replacing its contents), returning the
    /// number of payload bytes
    fn encode(&mut self, frame: &RawFrame, out: &mut Vec<u8>) -> Result<usize>;

    /// Codec the produced payloads belong to
    fn codec(&self) -> VideoCodec;
}

/// Create a frame encoder for the given codec
pub fn create_encoder(codec: VideoCodec, jpeg_quality: u8) -> Box<dyn FrameEncoder> {
    info!("Creating frame encoder: codec={}, jpeg_quality={}", codec, jpeg_quality);

    match codec {
        VideoCodec::Rgb24 => Box::new(DibEncoder),
        VideoCodec::Mjpeg => Box::new(JpegEncoder::new(jpeg_quality)),
    }
}

/// Uncompressed 24-bit DIB encoder
#[derive(Debug, Default)]
pub struct DibEncoder;

impl FrameEncoder for DibEncoder {
    fn encode(&mut self, frame: &RawFrame, out: &mut Vec<u8>) -> Result<usize> {
        if !frame.is_valid() {
            bail!(
                "Frame {} has {} bytes, expected {} for {}x{} {:?}",
                frame.sequence,
                frame.data.len(),
                frame.expected_size(),
                frame.width,
                frame.height,
                frame.format
            );
        }
        Ok(frame.write_dib(out))
    }

    fn codec(&self) -> VideoCodec {
        VideoCodec::Rgb24
    }
}

/// Motion JPEG encoder
#[derive(Debug)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&mut self, frame: &RawFrame, out: &mut Vec<u8>) -> Result<usize> {
        if !frame.is_valid() {
            bail!(
                "Frame {} has {} bytes, expected {}",
                frame.sequence,
                frame.data.len(),
                frame.expected_size()
            );
        }

        let rgb = frame.to_rgb24();
        out.clear();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut *out, self.quality)
            .encode(&rgb, frame.width, frame.height, image::ColorType::Rgb8)
            .with_context(|| format!("JPEG encoding of frame {} failed", frame.sequence))?;

        Ok(out.len())
    }

    fn codec(&self) -> VideoCodec {
        VideoCodec::Mjpeg
    }
}
