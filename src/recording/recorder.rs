/*!
 * Screen Recorder
 *
 * Owns the capture thread of a recording session and its counters.
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use super::pacing::FrameTicker;
use super::projector::should_rotate;
use super::segment::SegmentSequence;
use super::RecorderSettings;
use crate::avi::{AviError, StreamParams};
use crate::capture::{CaptureRegion, FrameSource};
use crate::video::VideoCodec;

/// Name of the capture thread
const CAPTURE_THREAD_NAME: &str = "screen-recording";

/// Errors returned by `ScreenRecorder`
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Invalid capture region: {0}")]
    InvalidRegion(String),

    #[error("Output path is required")]
    EmptyOutputPath,

    #[error("A recording session is already in progress")]
    AlreadyRecording,

    #[error("Frame source produces {actual} frames, recorder is configured for {expected}")]
    CodecMismatch { expected: VideoCodec, actual: VideoCodec },

    #[error("Failed to initialize AVI writer: {0}")]
    Avi(#[from] AviError),

    #[error("Failed to spawn capture thread: {0}")]
    Spawn(std::io::Error),

    #[error("Capture thread panicked")]
    ThreadPanicked,
}

/// Live counters of the current session
#[derive(Debug, Clone, Default)]
pub struct RecordingStats {
    /// Frames written across all segments
    pub frames_written: u64,
    /// Segments opened so far
    pub segments: u64,
    /// Frame payload bytes written
    pub bytes_written: u64,
    /// Ticks skipped because a frame overran its interval
    pub skipped_ticks: u64,
    /// Session uptime (seconds)
    pub uptime_secs: u64,
}

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct RecordingSummary {
    pub frames: u64,
    pub segments: u64,
    /// Segment files in order
    pub files: Vec<PathBuf>,
    pub duration: Duration,
    pub skipped_ticks: u64,
    /// Error that ended the session early, if any
    pub error: Option<String>,
}

/// What the capture thread hands back when it exits
struct SessionOutcome {
    files: Vec<PathBuf>,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct Counters {
    frames_written: AtomicU64,
    segments: AtomicU64,
    bytes_written: AtomicU64,
    skipped_ticks: AtomicU64,
}

impl Counters {
    fn reset(&self) {
        self.frames_written.store(0, Ordering::Relaxed);
        self.segments.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.skipped_ticks.store(0, Ordering::Relaxed);
    }
}

/// Records a screen region into size-bounded AVI segments
pub struct ScreenRecorder {
    settings: RecorderSettings,
    is_recording: Arc<Mutex<bool>>,
    counters: Arc<Counters>,
    start_time: Option<Instant>,
    session: Option<JoinHandle<SessionOutcome>>,
}

impl ScreenRecorder {
    pub fn new(settings: RecorderSettings) -> Self {
        info!(
            "Screen recorder initialized: fps={}, codec={}, max_segment_bytes={}",
            settings.fps, settings.codec, settings.max_segment_bytes
        );

        Self {
            settings,
            is_recording: Arc::new(Mutex::new(false)),
            counters: Arc::new(Counters::default()),
            start_time: None,
            session: None,
        }
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Start recording `region` into `output_path` (segment 1).
    ///
    /// The first segment is created before this returns, so an unwritable
    /// path is reported here rather than from the capture thread.
    pub fn start(
        &mut self,
        region: CaptureRegion,
        output_path: impl AsRef<Path>,
        source: Box<dyn FrameSource>,
    ) -> Result<(), RecorderError> {
        let output_path = output_path.as_ref();

        if region.is_empty() {
            return Err(RecorderError::InvalidRegion(format!(
                "{} must have a positive size",
                region
            )));
        }
        if output_path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(RecorderError::EmptyOutputPath);
        }
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }
        if source.codec() != self.settings.codec {
            return Err(RecorderError::CodecMismatch {
                expected: self.settings.codec,
                actual: source.codec(),
            });
        }

        // A session that ended on its own is reaped before starting another
        if let Some(summary) = self.stop()? {
            info!("Previous session ended with {} frames", summary.frames);
        }

        let params = StreamParams::new(
            region.width,
            region.height,
            self.settings.fps,
            self.settings.codec,
        );
        let segments = SegmentSequence::open(output_path, params)?;

        self.counters.reset();
        self.counters.segments.store(1, Ordering::Relaxed);
        set_flag(&self.is_recording, true);
        self.start_time = Some(Instant::now());

        let ctx = SessionContext {
            region,
            settings: self.settings,
            is_recording: Arc::clone(&self.is_recording),
            counters: Arc::clone(&self.counters),
        };
        let spawned = std::thread::Builder::new()
            .name(CAPTURE_THREAD_NAME.to_string())
            .spawn(move || run_session(ctx, segments, source));

        match spawned {
            Ok(handle) => {
                self.session = Some(handle);
                info!(
                    "Recording started. Output: {}, Region: {}, Codec: {}",
                    output_path.display(),
                    region,
                    self.settings.codec
                );
                Ok(())
            }
            Err(e) => {
                set_flag(&self.is_recording, false);
                self.start_time = None;
                Err(RecorderError::Spawn(e))
            }
        }
    }

    /// Stop the session and wait for the capture thread to finalize the
    /// active segment. Returns `None` if no session was started.
    pub fn stop(&mut self) -> Result<Option<RecordingSummary>, RecorderError> {
        set_flag(&self.is_recording, false);

        let Some(handle) = self.session.take() else {
            return Ok(None);
        };

        info!("Stopping recording, waiting for capture thread...");
        let outcome = handle.join().map_err(|_| RecorderError::ThreadPanicked)?;
        let duration = self.start_time.take().map(|t| t.elapsed()).unwrap_or_default();

        let summary = RecordingSummary {
            frames: self.counters.frames_written.load(Ordering::Relaxed),
            segments: self.counters.segments.load(Ordering::Relaxed),
            files: outcome.files,
            duration,
            skipped_ticks: self.counters.skipped_ticks.load(Ordering::Relaxed),
            error: outcome.error,
        };

        info!(
            "Recording stopped. Duration={:.2}s, Frames={}, Segments={}",
            summary.duration.as_secs_f64(),
            summary.frames,
            summary.segments
        );
        Ok(Some(summary))
    }

    /// True while the capture thread is running its loop
    pub fn is_recording(&self) -> bool {
        read_flag(&self.is_recording)
    }

    /// Get recording statistics
    pub fn stats(&self) -> RecordingStats {
        let uptime_secs = self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        RecordingStats {
            frames_written: self.counters.frames_written.load(Ordering::Relaxed),
            segments: self.counters.segments.load(Ordering::Relaxed),
            bytes_written: self.counters.bytes_written.load(Ordering::Relaxed),
            skipped_ticks: self.counters.skipped_ticks.load(Ordering::Relaxed),
            uptime_secs,
        }
    }
}

impl Drop for ScreenRecorder {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.stop() {
                error!("Failed to stop recording on drop: {}", e);
            }
        }
    }
}

/// State moved onto the capture thread alongside the segments and source
struct SessionContext {
    region: CaptureRegion,
    settings: RecorderSettings,
    is_recording: Arc<Mutex<bool>>,
    counters: Arc<Counters>,
}

fn run_session(
    ctx: SessionContext,
    mut segments: SegmentSequence,
    mut source: Box<dyn FrameSource>,
) -> SessionOutcome {
    let mut ticker = FrameTicker::new(ctx.settings.fps);
    let mut failure = None;

    while read_flag(&ctx.is_recording) {
        if let Err(e) = capture_tick(&ctx, &mut segments, source.as_mut()) {
            match e.downcast_ref::<AviError>() {
                Some(avi) if avi.is_contract_violation() => {
                    error!("Contract violation in capture loop: {}", avi)
                }
                _ => error!("Recording error: {:#}", e),
            }
            failure = Some(format!("{:#}", e));
            break;
        }

        let skipped = ticker.wait();
        if skipped > 0 {
            ctx.counters.skipped_ticks.fetch_add(skipped, Ordering::Relaxed);
        }
    }

    if let Err(e) = segments.finish() {
        error!(
            "Failed to finalize segment {} ({}): {}",
            segments.index(),
            segments.current_path().display(),
            e
        );
        failure.get_or_insert_with(|| e.to_string());
    }
    set_flag(&ctx.is_recording, false);

    info!(
        "Recording loop stopped. CapturedFrames={}",
        ctx.counters.frames_written.load(Ordering::Relaxed)
    );
    SessionOutcome {
        files: segments.files().to_vec(),
        error: failure,
    }
}

/// Capture one frame and append it to the active segment, rotating first
/// if the frame would push the segment to the ceiling.
fn capture_tick(
    ctx: &SessionContext,
    segments: &mut SegmentSequence,
    source: &mut dyn FrameSource,
) -> anyhow::Result<()> {
    let frame = source.capture(&ctx.region)?;
    let len = frame.len();

    if should_rotate(segments.writer(), len, ctx.settings.max_segment_bytes) {
        if segments.writer().frame_count() == 0 {
            warn!(
                "Frame of {} bytes exceeds the {} byte segment ceiling on its own; \
                 writing it anyway",
                len, ctx.settings.max_segment_bytes
            );
        } else {
            segments.rotate()?;
            ctx.counters.segments.fetch_add(1, Ordering::Relaxed);
        }
    }

    segments.writer_mut().write_frame(frame, len)?;
    ctx.counters.frames_written.fetch_add(1, Ordering::Relaxed);
    ctx.counters.bytes_written.fetch_add(len as u64, Ordering::Relaxed);
    Ok(())
}

fn set_flag(flag: &Mutex<bool>, value: bool) {
    *flag.lock().unwrap_or_else(|e| e.into_inner()) = value;
}

fn read_flag(flag: &Mutex<bool>) -> bool {
    *flag.lock().unwrap_or_else(|e| e.into_inner())
}
