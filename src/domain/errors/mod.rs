// Domain errors - Error types for the domain layer

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific error types
///
/// Every variant is fatal to a run. Nothing is retried; the external tool's
/// diagnostic output is carried along so a misconfigured environment can be
/// diagnosed from the message alone.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest unreachable or malformed
    #[error("Failed to fetch master manifest: {0}")]
    Fetch(String),

    /// The probe tool exited non-zero or produced unparsable output
    #[error("Error running probe on {path}: {message}")]
    ProbeFailed { path: String, message: String },

    /// Media has the wrong stream topology or dimensions
    #[error("Invalid media {path}: {message}")]
    InvalidMedia { path: String, message: String },

    /// Remux failure or post-remux validation mismatch
    #[error("Failed to materialize variant {uri}: {message}")]
    MaterializeFailed { uri: String, message: String },

    /// Viewer distribution file missing, malformed or with a wrong bucket count
    #[error("Invalid viewer distribution: {0}")]
    DistributionFormat(String),

    /// The decode tool exited non-zero
    #[error("Error decoding {input} to {width}x{height}: {message}")]
    DecodeFailed {
        input: String,
        width: u64,
        height: u64,
        message: String,
    },

    /// The scorer exited non-zero or its log could not be parsed
    #[error("Error running VMAF at {width}x{height}: {message}")]
    ScoreToolFailed {
        width: u64,
        height: u64,
        message: String,
    },

    /// A computed score fell below the configured threshold
    #[error(
        "Low VMAF score detected, most likely due to misconfiguration. \
         Score {score} is below threshold {threshold}"
    )]
    LowScoreDetected { score: f64, threshold: f64 },

    /// Cancelled because a sibling operation failed or the run was interrupted
    #[error("Operation cancelled")]
    Cancelled,

    /// Filesystem error
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DomainError {
    /// Wrap an I/O error together with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_score_message_carries_both_values() {
        let err = DomainError::LowScoreDetected {
            score: -1.5,
            threshold: 0.0,
        };
        let message = err.to_string();
        assert!(message.contains("-1.5"));
        assert!(message.contains("threshold 0"));
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = DomainError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.json"));
        assert!(!err.is_cancelled());
        assert!(DomainError::Cancelled.is_cancelled());
    }
}
