//! Analyzer configuration and layering
//!
//! Precedence, lowest to highest: built-in defaults, the TOML config file,
//! `LADDER_VMAF_*` environment variables, command-line flags. Environment and
//! flags arrive together as one layer since clap resolves both.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{ShareBasis, SkippedCells};
use crate::utils::logging::LogLevel;

/// Default VMAF model location
pub const DEFAULT_MODEL: &str = "model/vmaf_v0.6.1.pkl";

/// Default viewer distribution file
pub const DEFAULT_DATAFILE: &str = "data.json";

/// Smallest width or height worth scoring
pub const DEFAULT_MIN_RESOLUTION: u64 = 192;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "ladder-vmaf.toml";

/// Immutable settings for one estimation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Score every Nth frame
    pub subsample: u32,
    /// Worker threads handed to the scorer
    pub threads: usize,
    pub model: PathBuf,
    pub datafile: PathBuf,
    /// Holds materialized variants and the decode scratch pipes
    pub work_dir: PathBuf,
    /// Holds one scorer log per quality cell
    pub logs_dir: PathBuf,
    pub min_resolution: u64,
    /// Cell scores strictly below this abort the run
    pub low_score_threshold: f64,
    pub share_basis: ShareBasis,
    pub skipped_cells: SkippedCells,
    /// Distribution sums further than this from 1.0 are reported
    pub distribution_sum_tolerance: f64,
    /// Compare frame counts using per-frame timestamps rather than container metadata
    pub probe_frames: bool,
    pub ffprobe: String,
    pub ffmpeg: String,
    pub vmafossexec: String,
    pub log_level: LogLevel,
    pub log_json: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            subsample: 30,
            threads: num_cpus::get(),
            model: PathBuf::from(DEFAULT_MODEL),
            datafile: PathBuf::from(DEFAULT_DATAFILE),
            work_dir: PathBuf::from("/tmp"),
            logs_dir: PathBuf::from("logs"),
            min_resolution: DEFAULT_MIN_RESOLUTION,
            low_score_threshold: 0.0,
            share_basis: ShareBasis::default(),
            skipped_cells: SkippedCells::default(),
            distribution_sum_tolerance: 0.01,
            probe_frames: true,
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            vmafossexec: "vmafossexec".to_string(),
            log_level: LogLevel::default(),
            log_json: false,
        }
    }
}

/// One partial source of settings; unset fields fall through to lower layers
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub subsample: Option<u32>,
    pub threads: Option<usize>,
    pub model: Option<PathBuf>,
    pub datafile: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub min_resolution: Option<u64>,
    pub low_score_threshold: Option<f64>,
    pub share_basis: Option<ShareBasis>,
    pub skipped_cells: Option<SkippedCells>,
    pub distribution_sum_tolerance: Option<f64>,
    pub probe_frames: Option<bool>,
    pub ffprobe: Option<String>,
    pub ffmpeg: Option<String>,
    pub vmafossexec: Option<String>,
    pub log_level: Option<LogLevel>,
    pub log_json: Option<bool>,
}

macro_rules! overlay {
    ($config:ident, $layer:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $layer.$field {
                $config.$field = value;
            }
        )+
    };
}

impl AnalyzerConfig {
    /// Build a validated configuration from layers ordered lowest precedence first
    pub fn layered<I>(layers: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        let mut config = Self::default();
        for layer in layers {
            config.apply(layer);
        }
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    /// Overwrite every field the layer sets
    pub fn apply(&mut self, layer: ConfigLayer) {
        let config = self;
        overlay!(
            config,
            layer,
            subsample,
            threads,
            model,
            datafile,
            work_dir,
            logs_dir,
            min_resolution,
            low_score_threshold,
            share_basis,
            skipped_cells,
            distribution_sum_tolerance,
            probe_frames,
            ffprobe,
            ffmpeg,
            vmafossexec,
            log_level,
            log_json,
        );
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.threads == 0 {
            return Err(DomainError::Config("threads must be at least 1".to_string()));
        }
        if self.subsample == 0 {
            return Err(DomainError::Config("subsample must be at least 1".to_string()));
        }
        if self.model.as_os_str().is_empty() {
            return Err(DomainError::Config("model path must not be empty".to_string()));
        }
        if !self.low_score_threshold.is_finite() {
            return Err(DomainError::Config(format!(
                "low score threshold must be finite, got {}",
                self.low_score_threshold
            )));
        }
        if !self.distribution_sum_tolerance.is_finite() || self.distribution_sum_tolerance < 0.0 {
            return Err(DomainError::Config(format!(
                "distribution sum tolerance must be a non-negative number, got {}",
                self.distribution_sum_tolerance
            )));
        }
        for (name, program) in [
            ("ffprobe", &self.ffprobe),
            ("ffmpeg", &self.ffmpeg),
            ("vmafossexec", &self.vmafossexec),
        ] {
            if program.trim().is_empty() {
                return Err(DomainError::Config(format!("{} program must not be empty", name)));
            }
        }
        Ok(())
    }
}
