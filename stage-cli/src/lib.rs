//! # Stage Export
//!
//! Headless host for the stage editor: replays a JSON script of editor
//! operations against an [`EditorSession`] and writes the exported image.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p stage-cli -- --script poster.json --format jpg --quality 0.8
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ExportJob` - Canvas size, export options and output location
//! - `script` - The operation format and how it maps onto the session
//! - [`run`] - Executes one job end to end

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod script;

pub use script::{apply_script, parse_script, ScriptOp};

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use stage_core::{Background, Color};
use stage_renderer::{EditorSession, ExportFormat, ExportOptions, SessionConfig, TraceSurface};

/// Command-line arguments for stage-export.
#[derive(Debug, Clone, Parser)]
#[command(name = "stage-export")]
#[command(about = "Render a scripted stage canvas to PNG or JPEG")]
#[command(version)]
pub struct CliArgs {
    /// JSON script of editor operations
    #[arg(long, env = "STAGE_SCRIPT")]
    pub script: PathBuf,

    /// Output file (defaults to stage-<unix ms>.<ext> in the working directory)
    #[arg(long, env = "STAGE_OUT")]
    pub out: Option<PathBuf>,

    /// Output format: png or jpg
    #[arg(long, env = "STAGE_FORMAT", default_value = "png", value_parser = parse_format)]
    pub format: ExportFormat,

    /// Encoder quality in 0..=1 (JPEG only)
    #[arg(long, env = "STAGE_QUALITY", default_value_t = 0.92)]
    pub quality: f32,

    /// Device pixel ratio of the output
    #[arg(
        long,
        env = "STAGE_SCALE",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=5)
    )]
    pub scale: u32,

    /// Canvas width in pixels
    #[arg(long, env = "STAGE_WIDTH", default_value_t = 1920.0)]
    pub width: f32,

    /// Canvas height in pixels
    #[arg(long, env = "STAGE_HEIGHT", default_value_t = 1080.0)]
    pub height: f32,

    /// Solid background color applied before the script runs
    #[arg(long, env = "STAGE_BACKGROUND")]
    pub background: Option<String>,

    /// Bound on each image load, in milliseconds
    #[arg(long, env = "STAGE_ASSET_TIMEOUT_MS", default_value_t = 5000)]
    pub asset_timeout_ms: u64,
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    value.parse::<ExportFormat>().map_err(|e| e.to_string())
}

/// One export run.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Script to replay.
    pub script: PathBuf,
    /// Explicit output path.
    pub out: Option<PathBuf>,
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    /// Initial background color.
    pub background: Option<String>,
    /// Bound on each image load.
    pub asset_timeout: Duration,
    /// Encoder settings.
    pub options: ExportOptions,
}

impl ExportJob {
    /// A job for `script` with default canvas and export settings.
    #[must_use]
    pub fn new(script: impl Into<PathBuf>) -> Self {
        let config = SessionConfig::default();
        Self {
            script: script.into(),
            out: None,
            width: config.width,
            height: config.height,
            background: None,
            asset_timeout: config.load_timeout,
            options: ExportOptions::default(),
        }
    }

    /// Session configuration for this job.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            width: self.width,
            height: self.height,
            load_timeout: self.asset_timeout,
            asset_wait_timeout: self.asset_timeout,
            ..SessionConfig::default()
        }
    }

    /// Encoder settings for this job.
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        self.options
    }
}

impl From<CliArgs> for ExportJob {
    fn from(args: CliArgs) -> Self {
        Self {
            script: args.script,
            out: args.out,
            width: args.width,
            height: args.height,
            background: args.background,
            asset_timeout: Duration::from_millis(args.asset_timeout_ms),
            options: ExportOptions {
                format: args.format,
                quality: args.quality,
                pixel_ratio: args.scale,
            },
        }
    }
}

/// Replay the job's script and write the export.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns an error if the script cannot be read or applied, the export
/// fails, or the output cannot be written.
pub async fn run(job: &ExportJob) -> anyhow::Result<PathBuf> {
    let options = job.export_options();
    options.validate()?;

    let json = tokio::fs::read_to_string(&job.script)
        .await
        .with_context(|| format!("Failed to read script {}", job.script.display()))?;
    let ops = parse_script(&json)?;
    let base = job.script.parent().unwrap_or_else(|| Path::new("."));

    let mut session = EditorSession::new(job.session_config());
    session.initialize(Box::new(TraceSurface::new()));

    if let Some(ref color) = job.background {
        session.set_background(Background::solid(Color::parse_hex(color)?));
    }

    apply_script(&mut session, &ops, base).await?;
    tracing::info!(
        "Script applied: {} operations, {} objects",
        ops.len(),
        session.objects().len()
    );

    let image = session.export_with(options).await?;
    let path = match job.out {
        Some(ref out) => out.clone(),
        None => PathBuf::from(image.file_name(unix_millis())),
    };

    tokio::fs::write(&path, &image.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(
        "Wrote {}x{} {} ({} bytes) to {}",
        image.width,
        image.height,
        image.format,
        image.bytes.len(),
        path.display()
    );

    Ok(path)
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_into_job() {
        let args = CliArgs::try_parse_from([
            "stage-export",
            "--script",
            "s.json",
            "--format",
            "jpg",
            "--quality",
            "0.5",
            "--scale",
            "2",
            "--width",
            "640",
            "--height",
            "480",
            "--asset-timeout-ms",
            "250",
        ])
        .expect("parse");
        let job = ExportJob::from(args);

        assert_eq!(job.script, PathBuf::from("s.json"));
        assert_eq!(job.options.format, ExportFormat::Jpeg);
        assert_eq!(job.options.pixel_ratio, 2);
        assert_eq!(job.session_config().width, 640.0);
        assert_eq!(job.session_config().load_timeout, Duration::from_millis(250));
        assert_eq!(job.export_options().quality, 0.5);
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["stage-export", "--script", "s.json"]).expect("parse");
        assert_eq!(args.format, ExportFormat::Png);
        assert_eq!(args.scale, 1);
        assert!(args.out.is_none());

        let job = ExportJob::new("s.json");
        assert_eq!(job.width, 1920.0);
        assert_eq!(job.asset_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_format_and_scale() {
        assert!(
            CliArgs::try_parse_from(["stage-export", "--script", "s", "--format", "gif"]).is_err()
        );
        assert!(CliArgs::try_parse_from(["stage-export", "--script", "s", "--scale", "6"]).is_err());
    }
}
