//! CLI module for ladder-vmaf
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigLayer;
use crate::domain::model::{ShareBasis, SkippedCells};
use crate::utils::logging::LogLevel;

pub mod args;
pub mod commands;

pub use args::ReportFormat;

/// ladder-vmaf
///
/// Estimates the quality the average viewer experiences from an HLS encoding
/// ladder, weighting per-rendition VMAF scores by real viewer bandwidth and
/// display-width distributions.
#[derive(Parser, Debug)]
#[command(name = "ladder-vmaf")]
#[command(about = "Average viewer VMAF of an HLS encoding ladder")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Score every Nth frame
    #[arg(long, env = "LADDER_VMAF_SUBSAMPLE", value_parser = args::parse_subsample)]
    pub subsample: Option<u32>,

    /// Threads handed to the VMAF scorer [default: number of CPUs]
    #[arg(long, env = "LADDER_VMAF_THREADS", value_parser = args::parse_threads)]
    pub threads: Option<usize>,

    /// VMAF model file [default: model/vmaf_v0.6.1.pkl]
    #[arg(long, env = "LADDER_VMAF_MODEL")]
    pub model: Option<PathBuf>,

    /// Viewer distribution JSON file [default: data.json]
    #[arg(long, env = "LADDER_VMAF_DATAFILE")]
    pub datafile: Option<PathBuf>,

    /// TOML config file [default: ./ladder-vmaf.toml when present]
    #[arg(long, env = "LADDER_VMAF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for materialized variants and decode pipes [default: /tmp]
    #[arg(long, env = "LADDER_VMAF_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory for per-cell VMAF logs [default: logs]
    #[arg(long, env = "LADDER_VMAF_LOGS_DIR")]
    pub logs_dir: Option<PathBuf>,

    /// Smallest width or height worth scoring [default: 192]
    #[arg(long, env = "LADDER_VMAF_MIN_RESOLUTION")]
    pub min_resolution: Option<u64>,

    /// Abort when a cell scores below this [default: 0]
    #[arg(long, env = "LADDER_VMAF_LOW_SCORE_THRESHOLD", allow_negative_numbers = true)]
    pub low_score_threshold: Option<f64>,

    /// Average over all viewers or only those who can play something (all, playable)
    #[arg(long, env = "LADDER_VMAF_SHARE_BASIS")]
    pub share_basis: Option<ShareBasis>,

    /// Count skipped cells as zero or leave them out of the weights (zero, exclude)
    #[arg(long, env = "LADDER_VMAF_SKIPPED_CELLS")]
    pub skipped_cells: Option<SkippedCells>,

    /// Compare frame counts from container metadata instead of probing every frame
    #[arg(long, env = "LADDER_VMAF_NO_FRAME_PROBE")]
    pub no_frame_probe: bool,

    /// ffprobe executable
    #[arg(long, env = "LADDER_VMAF_FFPROBE")]
    pub ffprobe: Option<String>,

    /// ffmpeg executable
    #[arg(long, env = "LADDER_VMAF_FFMPEG")]
    pub ffmpeg: Option<String>,

    /// vmafossexec executable
    #[arg(long, env = "LADDER_VMAF_VMAFOSSEXEC")]
    pub vmafossexec: Option<String>,

    /// Report format
    #[arg(long, env = "LADDER_VMAF_FORMAT", value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, env = "LADDER_VMAF_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LADDER_VMAF_LOG_JSON")]
    pub log_json: bool,

    /// Reference (mezzanine) video file
    pub mezzanine: PathBuf,

    /// URL of the HLS master playlist
    pub manifest_url: String,
}

impl Cli {
    /// Settings given on the command line or through the environment
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            subsample: self.subsample,
            threads: self.threads,
            model: self.model.clone(),
            datafile: self.datafile.clone(),
            work_dir: self.work_dir.clone(),
            logs_dir: self.logs_dir.clone(),
            min_resolution: self.min_resolution,
            low_score_threshold: self.low_score_threshold,
            share_basis: self.share_basis,
            skipped_cells: self.skipped_cells,
            distribution_sum_tolerance: None,
            probe_frames: self.no_frame_probe.then_some(false),
            ffprobe: self.ffprobe.clone(),
            ffmpeg: self.ffmpeg.clone(),
            vmafossexec: self.vmafossexec.clone(),
            log_level: self.log_level,
            log_json: self.log_json.then_some(true),
        }
    }
}
