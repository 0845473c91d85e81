//! Linux Screen Capture
//!
//! Grabs the X11 root window with scrot, falling back to ImageMagick
//! `import`, then crops the decoded screenshot to the recorded region.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use super::{CaptureRegion, ScreenGrabber};
use crate::video::{PixelFormat, RawFrame};

pub struct LinuxGrabber {
    /// Per-grabber screenshot file, reused every frame
    temp_path: PathBuf,
    frame_count: u64,
}

impl LinuxGrabber {
    pub fn new() -> Result<Self> {
        info!("Creating Linux screen grabber");

        if std::env::var_os("DISPLAY").is_none() {
            bail!("DISPLAY is not set; an X11 session is required for screen capture");
        }

        let temp_name = format!("screenrec_{}.png", uuid::Uuid::new_v4());
        let temp_path = std::env::temp_dir().join(temp_name);
        debug!("Screenshot scratch file: {}", temp_path.display());

        Ok(Self {
            temp_path,
            frame_count: 0,
        })
    }

    /// Capture the whole screen as PNG bytes
    fn capture_screenshot(&self) -> Result<Vec<u8>> {
        match capture_with_tool("scrot", &["-o"], &self.temp_path) {
            Ok(data) => return Ok(data),
            Err(e) => warn!("scrot failed, trying fallback: {}", e),
        }

        capture_with_tool("import", &["-window", "root"], &self.temp_path)
            .context("All screenshot methods failed (install scrot or imagemagick)")
    }
}

impl ScreenGrabber for LinuxGrabber {
    fn grab(&mut self, region: &CaptureRegion) -> Result<RawFrame> {
        if region.x < 0 || region.y < 0 {
            bail!("Region {} starts outside the root window", region);
        }

        let png = self.capture_screenshot()?;
        let image = image::load_from_memory(&png)
            .context("Failed to decode screenshot")?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let screen = RawFrame::new(
            image.into_raw(),
            width,
            height,
            PixelFormat::RGBA,
            self.frame_count,
        );
        self.frame_count += 1;

        screen
            .crop(region.x as u32, region.y as u32, region.width, region.height)
            .with_context(|| {
                format!("Region {} does not fit the {}x{} screen", region, width, height)
            })
    }

    fn name(&self) -> &'static str {
        "linux-x11"
    }
}

impl Drop for LinuxGrabber {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.temp_path);
    }
}

/// Run a screenshot tool writing to `path` and read the result back
fn capture_with_tool(tool: &str, args: &[&str], path: &Path) -> Result<Vec<u8>> {
    let _ = fs::remove_file(path);

    let output = Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .with_context(|| format!("Failed to execute {}", tool))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} failed: {}", tool, stderr.trim());
    }

    let data = fs::read(path).context("Failed to read screenshot file")?;
    debug!("Screenshot captured with {}: {} bytes", tool, data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_reports_error() {
        let path = std::env::temp_dir().join(format!("screenrec_{}.png", uuid::Uuid::new_v4()));
        let err = capture_with_tool("screenrec-no-such-tool", &[], &path).unwrap_err();
        assert!(err.to_string().contains("screenrec-no-such-tool"));
    }

    #[test]
    #[ignore] // Needs an X11 session with scrot or imagemagick
    fn test_grab_region() {
        let mut grabber = LinuxGrabber::new().unwrap();
        let frame = grabber.grab(&CaptureRegion::new(0, 0, 64, 32)).unwrap();
        assert_eq!((frame.width, frame.height), (64, 32));
        assert!(frame.is_valid());
    }
}
