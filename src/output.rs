//! Output file naming.
//!
//! Recordings are named `rec_<n>_<HHhMMmSSs_dd-MM-yyyy>.avi`, where `n` is
//! one more than the highest counter already present in the folder.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

const RECORDING_PREFIX: &str = "rec_";
const RECORDING_EXTENSION: &str = "avi";
const CAPTURES_DIR: &str = "Captures";

/// `<Videos>/Captures`, falling back to the home directory, then the
/// current directory, when the platform has no videos folder.
pub fn default_capture_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CAPTURES_DIR)
}

/// Counter of an existing recording file name, e.g. 7 for `rec_7_...avi`.
fn recording_counter(file_name: &str) -> Option<u32> {
    let stem = file_name.strip_suffix(".avi")?;
    let rest = stem.strip_prefix(RECORDING_PREFIX)?;
    rest.split('_').next()?.parse().ok()
}

/// Next free recording counter in `dir` (1 for an empty or missing folder).
pub fn next_counter(dir: &Path) -> u32 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 1;
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| recording_counter(&entry.file_name().to_string_lossy()))
        .max()
        .map_or(1, |n| n.saturating_add(1))
}

/// File name for recording `counter` started at `started`.
pub fn recording_file_name(counter: u32, started: &DateTime<Local>) -> String {
    format!(
        "{}{}_{}.{}",
        RECORDING_PREFIX,
        counter,
        started.format("%Hh%Mm%Ss_%d-%m-%Y"),
        RECORDING_EXTENSION
    )
}

/// Create `dir` if needed and pick the path of the next recording in it.
pub fn next_recording_path(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let counter = next_counter(dir);
    let path = dir.join(recording_file_name(counter, &Local::now()));
    debug!("Next recording path: {}", path.display());
    Ok(path)
}
