use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::avi::MAX_USABLE_FILE_SIZE;
use crate::capture::{CaptureRegion, SourceKind};
use crate::recording::{RecorderSettings, DEFAULT_FPS};
use crate::video::{VideoCodec, DEFAULT_JPEG_QUALITY};

pub const DEFAULT_CONFIG_PATH: &str = "screenrec.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_max_segment_bytes() -> u64 {
    MAX_USABLE_FILE_SIZE
}

fn default_log_file() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub codec: VideoCodec,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// 0 disables segment rotation
    #[serde(default = "default_max_segment_bytes")]
    pub max_segment_bytes: u64,
    #[serde(default)]
    pub source: SourceKind,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            codec: VideoCodec::default(),
            jpeg_quality: default_jpeg_quality(),
            max_segment_bytes: default_max_segment_bytes(),
            source: SourceKind::default(),
        }
    }
}

impl RecordingConfig {
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            fps: self.fps,
            codec: self.codec,
            max_segment_bytes: self.max_segment_bytes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Folder for auto-named recordings; defaults to `<Videos>/Captures`
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Fixed output file, overriding auto naming
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RegionConfig {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<RegionConfig> for CaptureRegion {
    fn from(r: RegionConfig) -> Self {
        CaptureRegion::new(r.x, r.y, r.width, r.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Also append logs to `<temp>/screenrec.log`
    #[serde(default = "default_log_file")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Whole primary display when absent
    #[serde(default)]
    pub region: Option<RegionConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.recording.fps == 0 {
            return Err(ConfigError::Invalid("recording.fps must be positive".into()));
        }
        if !(1..=100).contains(&self.recording.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "recording.jpeg_quality {} is outside 1..=100",
                self.recording.jpeg_quality
            )));
        }
        if let Some(region) = &self.region {
            if region.width == 0 || region.height == 0 {
                return Err(ConfigError::Invalid("region must have a positive size".into()));
            }
        }
        if matches!(&self.output.path, Some(p) if p.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("output.path is empty".into()));
        }
        Ok(())
    }
}
