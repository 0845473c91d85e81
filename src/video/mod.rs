/*!
 * Video Frame Module
 *
 * Frame representations and the two frame encodings an AVI segment can carry:
 * uncompressed 24-bit DIB and Motion JPEG.
 */

pub mod encoder;
pub mod frame;

pub use encoder::{create_encoder, DibEncoder, FrameEncoder, JpegEncoder};
pub use frame::{PixelFormat, RawFrame};

use serde::Deserialize;

/// Default JPEG quality for MJPEG recordings
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Frame encoding stored in the AVI stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// Uncompressed bottom-up BGR, 3 bytes per pixel
    Rgb24,
    /// Motion JPEG, one JPEG image per frame
    Mjpeg,
}

impl VideoCodec {
    /// Chunk id of frame chunks in the `movi` list
    pub fn chunk_id(&self) -> [u8; 4] {
        match self {
            VideoCodec::Rgb24 => *b"00db",
            VideoCodec::Mjpeg => *b"00dc",
        }
    }

    /// `fccHandler` of the stream header
    pub fn handler(&self) -> [u8; 4] {
        match self {
            VideoCodec::Rgb24 => *b"DIB ",
            VideoCodec::Mjpeg => *b"MJPG",
        }
    }

    /// `biCompression` of the stream format (0 = BI_RGB)
    pub fn compression(&self) -> u32 {
        match self {
            VideoCodec::Rgb24 => 0,
            VideoCodec::Mjpeg => u32::from_le_bytes(*b"MJPG"),
        }
    }

    /// Exact frame length this codec demands, if any
    pub fn fixed_frame_len(&self, width: u32, height: u32) -> Option<u64> {
        match self {
            VideoCodec::Rgb24 => Some(width as u64 * height as u64 * 3),
            VideoCodec::Mjpeg => None,
        }
    }
}

impl Default for VideoCodec {
    fn default() -> Self {
        VideoCodec::Rgb24
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoCodec::Rgb24 => write!(f, "rgb24"),
            VideoCodec::Mjpeg => write!(f, "mjpeg"),
        }
    }
}
