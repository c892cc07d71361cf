// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a local media file and return its primary video stream metadata
    async fn probe(&self, path: &Path) -> Result<MediaInfo, DomainError>;
}

/// Port for copying a remote variant stream to local storage without re-encoding
#[async_trait]
pub trait RemuxPort: Send + Sync {
    async fn remux(&self, source_uri: &str, output: &Path) -> Result<(), DomainError>;
}

/// Port for decoding media to raw 8-bit planar 4:2:0 at an exact size
#[async_trait]
pub trait DecodePort: Send + Sync {
    async fn decode(
        &self,
        input: &Path,
        output: &Path,
        width: u64,
        height: u64,
    ) -> Result<(), DomainError>;
}

/// Everything the scorer needs for one quality cell
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub reference: PathBuf,
    pub distorted: PathBuf,
    pub width: u64,
    pub height: u64,
    /// Where the scorer writes its structured log
    pub log_path: PathBuf,
}

/// Port for the external perceptual quality scorer
#[async_trait]
pub trait ScorePort: Send + Sync {
    /// Run the scorer and return its parsed per-frame log
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreLog, DomainError>;
}

/// Port for retrieving the variant list of a master playlist
#[async_trait]
pub trait ManifestPort: Send + Sync {
    async fn fetch_variants(&self, manifest_url: &str) -> Result<Vec<VariantSource>, DomainError>;
}

/// Port for loading viewer distributions
#[async_trait]
pub trait DistributionPort: Send + Sync {
    async fn load(&self, path: &Path) -> Result<ViewerDistribution, DomainError>;
}
