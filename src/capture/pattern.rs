//! Synthetic test pattern grabber.
//!
//! Draws diagonal color bands that shift every frame, so recordings made
//! without a display still show motion.

use anyhow::Result;

use super::{CaptureRegion, ScreenGrabber};
use crate::video::{PixelFormat, RawFrame};

pub struct PatternGrabber {
    frame_count: u64,
}

impl PatternGrabber {
    pub fn new() -> Self {
        Self { frame_count: 0 }
    }
}

impl Default for PatternGrabber {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenGrabber for PatternGrabber {
    fn grab(&mut self, region: &CaptureRegion) -> Result<RawFrame> {
        let shift = self.frame_count as u32;
        let mut data = Vec::with_capacity(region.width as usize * region.height as usize * 3);
        for y in 0..region.height {
            for x in 0..region.width {
                let band = (x + y + shift * 4) % 256;
                data.push(band as u8);
                data.push((255 - band) as u8);
                data.push(((x ^ y) % 256) as u8);
            }
        }

        let frame = RawFrame::new(
            data,
            region.width,
            region.height,
            PixelFormat::RGB24,
            self.frame_count,
        );
        self.frame_count += 1;
        Ok(frame)
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_moves() {
        let mut grabber = PatternGrabber::new();
        let region = CaptureRegion::new(0, 0, 8, 4);
        let first = grabber.grab(&region).unwrap();
        let second = grabber.grab(&region).unwrap();

        assert!(first.is_valid());
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_ne!(first.data, second.data);
    }
}
