// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::config::{ConfigLayer, DEFAULT_CONFIG_FILE};
use crate::domain::errors::*;

/// File layout: every setting lives under an `[analyzer]` table
#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    analyzer: ConfigLayer,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Load the explicitly requested file, or `ladder-vmaf.toml` from the
    /// working directory when it exists. An explicit path must exist.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<ConfigLayer>, DomainError> {
        match explicit {
            Some(path) => Self::load(path).map(Some),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(&fallback).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Read and parse one config file
    pub fn load(path: &Path) -> Result<ConfigLayer, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let layer = Self::parse(&content).map_err(|e| match e {
            DomainError::Config(message) => {
                DomainError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        info!("Loading configuration from: {}", path.display());
        Ok(layer)
    }

    /// Parse TOML text into a configuration layer
    pub fn parse(content: &str) -> Result<ConfigLayer, DomainError> {
        let document: ConfigDocument = toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))?;
        Ok(document.analyzer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ShareBasis, SkippedCells};
    use crate::utils::logging::LogLevel;

    #[test]
    fn test_parse_analyzer_table() {
        let layer = TomlConfigAdapter::parse(
            r#"
            [analyzer]
            subsample = 10
            threads = 4
            model = "/opt/vmaf/vmaf_v0.6.1.pkl"
            share_basis = "playable"
            skipped_cells = "exclude"
            log_level = "debug"
            vmafossexec = "/usr/local/bin/vmafossexec"
            "#,
        )
        .unwrap();
        assert_eq!(layer.subsample, Some(10));
        assert_eq!(layer.threads, Some(4));
        assert_eq!(layer.model, Some(PathBuf::from("/opt/vmaf/vmaf_v0.6.1.pkl")));
        assert_eq!(layer.share_basis, Some(ShareBasis::PlayableViewers));
        assert_eq!(layer.skipped_cells, Some(SkippedCells::Exclude));
        assert_eq!(layer.log_level, Some(LogLevel::Debug));
        assert_eq!(layer.datafile, None);
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert_eq!(TomlConfigAdapter::parse("").unwrap(), ConfigLayer::default());

        let err = TomlConfigAdapter::parse("[analyzer]\ncrf = 18\n").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));

        let err = TomlConfigAdapter::parse("[analyzer]\nthreads = \"many\"\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(TomlConfigAdapter::discover(Some(&missing)).is_err());

        let present = temp.path().join("ladder.toml");
        std::fs::write(&present, "[analyzer]\nmin_resolution = 240\n").unwrap();
        let layer = TomlConfigAdapter::discover(Some(&present)).unwrap().unwrap();
        assert_eq!(layer.min_resolution, Some(240));
    }
}
