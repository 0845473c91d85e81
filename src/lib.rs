/*!
 * screenrec Library
 *
 * Screen region recording into size-bounded, segmented AVI files.
 */

pub mod avi;
pub mod capture;
pub mod config;
pub mod output;
pub mod platform;
pub mod recording;
pub mod validation;
pub mod video;

// Re-export commonly used types
pub use avi::{AviError, AviWriter, FinalizeTiming, StreamParams, MAX_USABLE_FILE_SIZE};
pub use capture::{CaptureRegion, FrameSource};
pub use config::Config;
pub use recording::{RecorderError, RecorderSettings, RecordingSummary, ScreenRecorder};
pub use video::VideoCodec;
