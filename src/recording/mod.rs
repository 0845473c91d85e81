/*!
 * Recording Module
 *
 * Drives a capture session: a dedicated thread paced at the nominal frame
 * rate pulls frames from a `FrameSource` and appends them to the active AVI
 * segment, rotating to a new segment file before the size ceiling is reached.
 */

pub mod pacing;
pub mod projector;
pub mod recorder;
pub mod segment;

pub use pacing::FrameTicker;
pub use projector::should_rotate;
pub use recorder::{RecorderError, RecordingStats, RecordingSummary, ScreenRecorder};
pub use segment::{segment_path, SegmentSequence};

use crate::avi::MAX_USABLE_FILE_SIZE;
use crate::video::VideoCodec;

/// Default capture rate
pub const DEFAULT_FPS: u32 = 24;

/// Recording session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    /// Nominal frames per second
    pub fps: u32,
    /// Frame encoding written to every segment
    pub codec: VideoCodec,
    /// Segment size ceiling in bytes (0 = unbounded)
    pub max_segment_bytes: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            codec: VideoCodec::Rgb24,
            max_segment_bytes: MAX_USABLE_FILE_SIZE,
        }
    }
}
