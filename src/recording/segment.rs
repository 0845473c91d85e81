//! Segment files of one recording session.
//!
//! Segment 1 is written to the base path; later segments get a
//! `_partNN` suffix before the extension. Only one segment is open at a time.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::avi::{AviResult, AviWriter, FinalizeTiming, StreamParams};

/// Path of segment `index` derived from `base`.
pub fn segment_path(base: &Path, index: u32) -> PathBuf {
    if index <= 1 {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_part{:02}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_part{:02}", stem, index),
    };
    base.with_file_name(name)
}

/// The active segment and the files written so far.
pub struct SegmentSequence {
    base_path: PathBuf,
    params: StreamParams,
    index: u32,
    writer: AviWriter,
    started: Instant,
    files: Vec<PathBuf>,
}

impl SegmentSequence {
    /// Open segment 1 at `base_path`.
    pub fn open(base_path: impl Into<PathBuf>, params: StreamParams) -> AviResult<Self> {
        let base_path = base_path.into();
        let writer = AviWriter::create(&base_path, params)?;

        Ok(Self {
            files: vec![base_path.clone()],
            base_path,
            params,
            index: 1,
            writer,
            started: Instant::now(),
        })
    }

    pub fn writer(&self) -> &AviWriter {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut AviWriter {
        &mut self.writer
    }

    /// Sequence number of the active segment, starting at 1.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Wall time covered by the active segment.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn current_path(&self) -> &Path {
        self.files.last().unwrap_or(&self.base_path).as_path()
    }

    /// Every segment file opened so far, in order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Finalize the active segment with its own elapsed time and open the next.
    pub fn rotate(&mut self) -> AviResult<()> {
        let elapsed = self.elapsed();
        let frames = self.writer.frame_count();
        let bytes = self.writer.position();
        self.writer.finalize(FinalizeTiming::Measured(elapsed))?;

        info!(
            "Segment {} reached the size ceiling ({} frames, {} bytes, {} ms), rotating",
            self.index,
            frames,
            bytes,
            elapsed.as_millis()
        );

        let next_index = self.index + 1;
        let next_path = segment_path(&self.base_path, next_index);
        self.writer = AviWriter::create(&next_path, self.params)?;
        self.index = next_index;
        self.started = Instant::now();
        info!("Segment {} opened: {}", next_index, next_path.display());
        self.files.push(next_path);
        Ok(())
    }

    /// Finalize the active segment. Safe to call more than once.
    pub fn finish(&mut self) -> AviResult<()> {
        if self.writer.is_finalized() {
            return Ok(());
        }
        let elapsed = self.elapsed();
        self.writer.finalize(FinalizeTiming::Measured(elapsed))?;
        Ok(())
    }
}
