//! Input validation for recording requests.
//!
//! Region and output path checks with descriptive error messages, applied
//! before a recording session is started.

use anyhow::{bail, Result};
use std::path::Path;

use crate::capture::CaptureRegion;

/// Validates capture regions against the display they are taken from.
#[derive(Debug)]
pub struct RegionValidator {
    screen_width: u32,
    screen_height: u32,
}

impl RegionValidator {
    /// Creates a new validator with the given screen resolution in pixels.
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
        }
    }

    /// Ensures the region has a positive size and lies fully on screen.
    pub fn validate(&self, region: &CaptureRegion) -> Result<()> {
        validate_region_size(region)?;

        if region.x < 0 {
            bail!("Region X {} is negative (min: 0)", region.x);
        }
        if region.y < 0 {
            bail!("Region Y {} is negative (min: 0)", region.y);
        }
        let right = region.x as u64 + region.width as u64;
        let bottom = region.y as u64 + region.height as u64;
        if right > self.screen_width as u64 {
            bail!(
                "Region {} extends past screen width {} (right edge: {})",
                region,
                self.screen_width,
                right
            );
        }
        if bottom > self.screen_height as u64 {
            bail!(
                "Region {} extends past screen height {} (bottom edge: {})",
                region,
                self.screen_height,
                bottom
            );
        }
        Ok(())
    }
}

/// Ensures a region can describe a video stream.
pub fn validate_region_size(region: &CaptureRegion) -> Result<()> {
    if region.width == 0 || region.height == 0 {
        bail!("Region {} must have a positive size", region);
    }
    if region.width > i16::MAX as u32 || region.height > i16::MAX as u32 {
        bail!("Region {} is too large (max: {} per side)", region, i16::MAX);
    }
    Ok(())
}

/// Validates a recording output path.
pub fn validate_output_path(path: &Path) -> Result<()> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        bail!("Output path cannot be empty");
    }
    if path.file_name().is_none() {
        bail!("Output path {} does not name a file", path.display());
    }
    if path.is_dir() {
        bail!("Output path {} is a directory", path.display());
    }
    Ok(())
}
