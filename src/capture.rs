/*!
 * Screen Capture Module
 *
 * Frame sources feeding the recorder. A `ScreenGrabber` produces raw frames
 * of a region; `EncodedSource` turns them into AVI frame payloads in a
 * buffer it owns and reuses across ticks.
 */

use anyhow::{bail, Result};
use tracing::info;

use crate::video::{create_encoder, FrameEncoder, RawFrame, VideoCodec};

// Platform-specific implementations
#[cfg(target_os = "linux")]
pub mod linux;
pub mod pattern;

/// Rectangle of the virtual desktop to record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Region covering a whole display of the given size
    pub fn full_display(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Source of encoded frame payloads, driven by the capture thread
pub trait FrameSource: Send {
    /// Capture one frame of `region`. The returned bytes stay owned by the
    /// source and are overwritten by the next call.
    fn capture(&mut self, region: &CaptureRegion) -> Result<&[u8]>;

    /// Encoding of the payloads this source returns
    fn codec(&self) -> VideoCodec;
}

/// Produces raw pixel frames of a region
pub trait ScreenGrabber: Send {
    fn grab(&mut self, region: &CaptureRegion) -> Result<RawFrame>;

    fn name(&self) -> &'static str;
}

/// Frame source that grabs raw frames and encodes them into a reused buffer
pub struct EncodedSource<G: ScreenGrabber> {
    grabber: G,
    encoder: Box<dyn FrameEncoder>,
    buffer: Vec<u8>,
}

impl<G: ScreenGrabber> EncodedSource<G> {
    pub fn new(grabber: G, encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            grabber,
            encoder,
            buffer: Vec::new(),
        }
    }
}

impl<G: ScreenGrabber> FrameSource for EncodedSource<G> {
    fn capture(&mut self, region: &CaptureRegion) -> Result<&[u8]> {
        let frame = self.grabber.grab(region)?;
        if frame.width != region.width || frame.height != region.height {
            bail!(
                "{} returned a {}x{} frame for region {}",
                self.grabber.name(),
                frame.width,
                frame.height,
                region
            );
        }

        let len = self.encoder.encode(&frame, &mut self.buffer)?;
        Ok(&self.buffer[..len])
    }

    fn codec(&self) -> VideoCodec {
        self.encoder.codec()
    }
}

/// Kind of grabber behind a frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The primary display
    #[default]
    Screen,
    /// Synthetic moving test pattern
    Pattern,
}

/// Create a frame source of `kind` encoding with `codec`
pub fn create_frame_source(
    kind: SourceKind,
    codec: VideoCodec,
    jpeg_quality: u8,
) -> Result<Box<dyn FrameSource>> {
    info!("Creating frame source: kind={:?}, codec={}", kind, codec);

    let encoder = create_encoder(codec, jpeg_quality);
    match kind {
        SourceKind::Pattern => {
            let grabber = pattern::PatternGrabber::new();
            Ok(Box::new(EncodedSource::new(grabber, encoder)))
        }
        SourceKind::Screen => create_screen_source(encoder),
    }
}

fn create_screen_source(encoder: Box<dyn FrameEncoder>) -> Result<Box<dyn FrameSource>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(EncodedSource::new(linux::LinuxGrabber::new()?, encoder)))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = encoder;
        Err(anyhow::anyhow!("Screen capture is not supported on this platform"))
    }
}
