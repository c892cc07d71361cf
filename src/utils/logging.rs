//! Logging configuration and progress reporting

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::domain::errors::DomainError;
use crate::utils::Utils;

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// General information
    #[default]
    Info,
    /// Debug information
    Debug,
    /// Very verbose debug information
    Trace,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = DomainError;

    fn from_str(level_str: &str) -> Result<Self, Self::Err> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Pretty,
    /// JSON format for structured logging
    Json,
}

/// Logging configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

/// Logging system manager
pub struct LoggingSystem {
    config: LoggingConfig,
}

impl LoggingSystem {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Install the global subscriber. Diagnostics go to stderr so stdout only
    /// carries the report. `RUST_LOG` takes precedence over the configured level.
    pub fn initialize(&self) -> Result<(), DomainError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_filter()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let result = match self.config.format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        result.map_err(|e| DomainError::Config(format!("Failed to initialize logging: {}", e)))
    }

    /// Log version and platform information
    pub fn log_system_info(&self) {
        tracing::info!("=== ladder-vmaf ===");
        tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
        tracing::debug!("Platform: {} {}", std::env::consts::OS, std::env::consts::ARCH);
        tracing::debug!("Logging level: {}", self.config.level);
    }
}

/// Progress reporter for the quality cell loop
pub struct ProgressReporter {
    total: usize,
    completed: usize,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one finished cell and log progress with an ETA
    pub fn cell_done(&mut self, description: &str) {
        self.completed += 1;
        tracing::info!("{}", self.message(description));
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn message(&self, description: &str) -> String {
        let mut message = format!("[{}/{}] {}", self.completed, self.total, description);

        if self.completed > 0 && self.completed < self.total {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let per_cell = elapsed / self.completed as f64;
            let eta = per_cell * (self.total - self.completed) as f64;
            message.push_str(&format!(
                " (ETA: {})",
                Utils::format_duration(Duration::from_secs_f64(eta))
            ));
        }

        message
    }
}
