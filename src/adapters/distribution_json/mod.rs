// Distribution adapter - Viewer distribution loading from JSON files

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// JSON viewer distribution adapter
///
/// Expects an object with `bandwidth_pcts` (exactly 100 entries) and
/// `resolution_pcts` arrays.
pub struct JsonDistributionAdapter;

impl JsonDistributionAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonDistributionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistributionPort for JsonDistributionAdapter {
    async fn load(&self, path: &Path) -> Result<ViewerDistribution, DomainError> {
        let raw = tokio::fs::read(path).await.map_err(|e| {
            DomainError::DistributionFormat(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let distribution = parse_distribution(&raw)?;
        debug!(
            path = %path.display(),
            bandwidth_sum = distribution.bandwidth_total(),
            resolution_buckets = distribution.resolution_buckets(),
            "Loaded viewer distribution"
        );
        Ok(distribution)
    }
}

/// Decode and validate a distribution document
pub fn parse_distribution(raw: &[u8]) -> Result<ViewerDistribution, DomainError> {
    let distribution: ViewerDistribution = serde_json::from_slice(raw)
        .map_err(|e| DomainError::DistributionFormat(format!("Failed to unmarshal data: {}", e)))?;
    distribution.validate()?;
    Ok(distribution)
}
