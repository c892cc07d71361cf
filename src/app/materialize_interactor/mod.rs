// Materialize interactor - Copies ladder variants locally and validates them

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::MediaValidator;
use crate::ports::*;
use crate::utils::cancel::guarded;
use crate::utils::path::PathUtils;

/// Interactor for the rendition materialization use case
pub struct MaterializeInteractor {
    remux_port: Arc<dyn RemuxPort>,
    probe_port: Arc<dyn ProbePort>,
    work_dir: PathBuf,
}

impl MaterializeInteractor {
    /// Create new materialize interactor with injected ports
    pub fn new(
        remux_port: Arc<dyn RemuxPort>,
        probe_port: Arc<dyn ProbePort>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            remux_port,
            probe_port,
            work_dir,
        }
    }

    /// Copy every variant to `<work_dir>/variant_<i>.ts`, re-probe it and check
    /// it against the reference.
    ///
    /// `variants` must already be in ladder order. The first failure aborts the
    /// whole ladder.
    pub async fn materialize_ladder(
        &self,
        variants: &[VariantSource],
        reference: &MediaInfo,
        token: &CancellationToken,
    ) -> Result<Vec<Rendition>, DomainError> {
        info!("Input has {} variants", variants.len());
        PathUtils::ensure_dir(&self.work_dir).await?;

        let mut renditions = Vec::with_capacity(variants.len());
        for (index, variant) in variants.iter().enumerate() {
            let rendition = guarded(token, self.materialize(index, variant, reference)).await?;
            renditions.push(rendition);
        }
        Ok(renditions)
    }

    async fn materialize(
        &self,
        index: usize,
        variant: &VariantSource,
        reference: &MediaInfo,
    ) -> Result<Rendition, DomainError> {
        let local_path = PathUtils::variant_output(&self.work_dir, index);
        info!("Dumping variant {} ({} bps)", index, variant.bandwidth_bps);

        self.remux_port.remux(&variant.uri, &local_path).await?;
        let info = self.probe_port.probe(&local_path).await?;
        MediaValidator::validate_rendition(&variant.uri, &info, reference)?;

        info!(variant = index, %info, "Variant info looks good");
        Ok(Rendition {
            source_uri: variant.uri.clone(),
            bandwidth_bps: variant.bandwidth_bps,
            local_path,
            info,
        })
    }
}
