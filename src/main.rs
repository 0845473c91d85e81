//! screenrec: records a screen region into size-bounded AVI segments until
//! Ctrl-C is pressed or the capture stops on its own.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use screenrec::capture::{create_frame_source, CaptureRegion};
use screenrec::config::{Config, DEFAULT_CONFIG_PATH};
use screenrec::validation::{validate_output_path, validate_region_size, RegionValidator};
use screenrec::{output, platform, ScreenRecorder};

/// How often the main task checks whether the capture thread ended on its own
const STATUS_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);

const LOG_FILE_NAME: &str = "screenrec.log";

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SCREENREC_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Console logging, plus an appending log file in the temp folder when
/// enabled and openable
fn init_logging(log_to_file: bool) -> Option<PathBuf> {
    let log_path = std::env::temp_dir().join(LOG_FILE_NAME);
    let file_layer = if log_to_file {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok()
            .map(|file| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
            })
    } else {
        None
    };
    let logs_to_file = file_layer.is_some();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    logs_to_file.then_some(log_path)
}

/// Configured region, or the whole primary display
fn resolve_region(config: &Config) -> Result<CaptureRegion> {
    let display = platform::get_primary_display_size();

    match (config.region, display) {
        (Some(region), Ok((width, height))) => {
            let region = CaptureRegion::from(region);
            RegionValidator::new(width, height).validate(&region)?;
            Ok(region)
        }
        (Some(region), Err(e)) => {
            warn!("Failed to get display size, region not checked against it: {}", e);
            let region = CaptureRegion::from(region);
            validate_region_size(&region)?;
            Ok(region)
        }
        (None, Ok((width, height))) => Ok(CaptureRegion::full_display(width, height)),
        (None, Err(e)) => {
            warn!("Failed to get display size, using 1920x1080: {}", e);
            Ok(CaptureRegion::full_display(1920, 1080))
        }
    }
}

fn resolve_output_path(config: &Config) -> Result<PathBuf> {
    let path = match &config.output.path {
        Some(path) => path.clone(),
        None => {
            let dir = config
                .output
                .directory
                .clone()
                .unwrap_or_else(output::default_capture_dir);
            output::next_recording_path(&dir)?
        }
    };
    validate_output_path(&path)?;
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path();
    let config = Config::load_or_default(&config_path);
    let log_file = init_logging(config.as_ref().map_or(true, |c| c.logging.file));

    let config = config.with_context(|| format!("Failed to load {}", config_path.display()))?;

    info!("screenrec v{} on {}", env!("CARGO_PKG_VERSION"), platform::get_platform_name());
    if let Some(log_file) = &log_file {
        info!("Logging to {}", log_file.display());
    }

    let region = resolve_region(&config)?;
    let output_path = resolve_output_path(&config)?;
    let settings = config.recording.recorder_settings();

    let source = create_frame_source(
        config.recording.source,
        settings.codec,
        config.recording.jpeg_quality,
    )
    .context("Failed to create frame source")?;

    let mut recorder = ScreenRecorder::new(settings);
    recorder
        .start(region, &output_path, source)
        .context("Failed to start recording")?;

    info!("Recording {} to {} (Ctrl-C to stop)", region, output_path.display());

    let mut poll = tokio::time::interval(STATUS_POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                match result {
                    Ok(()) => info!("Stop requested"),
                    Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
                }
                break;
            }
            _ = poll.tick() => {
                if !recorder.is_recording() {
                    warn!("Recording stopped on its own");
                    break;
                }
            }
        }
    }

    let summary = tokio::task::spawn_blocking(move || recorder.stop())
        .await
        .context("Stop task failed")??;

    if let Some(summary) = summary {
        for file in &summary.files {
            info!("Wrote {}", file.display());
        }
        info!(
            "{} frames in {} segment(s) over {:.1}s, {} ticks skipped",
            summary.frames,
            summary.segments,
            summary.duration.as_secs_f64(),
            summary.skipped_ticks
        );
        if let Some(e) = summary.error {
            anyhow::bail!("Recording ended with an error: {}", e);
        }
    }

    Ok(())
}
