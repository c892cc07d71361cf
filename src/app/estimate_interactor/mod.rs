// Estimate interactor - Orchestrates the average viewer VMAF use case

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::materialize_interactor::MaterializeInteractor;
use crate::app::quality_interactor::{QualityInteractor, QualityRequest};
use crate::config::AnalyzerConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::{Aggregator, BandwidthBucketer, MediaValidator};
use crate::ports::*;
use crate::utils::cancel::guarded;
use crate::utils::path::PathUtils;

/// The two inputs that identify a run
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRequest {
    /// Local reference (mezzanine) file
    pub mezzanine: PathBuf,
    /// Master playlist of the ladder under test
    pub manifest_url: String,
}

impl EstimateRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.mezzanine.as_os_str().is_empty() {
            return Err(DomainError::BadArgs("mezzanine path must not be empty".to_string()));
        }
        if self.manifest_url.trim().is_empty() {
            return Err(DomainError::BadArgs("manifest URL must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Interactor for the end-to-end estimation use case
pub struct EstimateInteractor {
    probe_port: Arc<dyn ProbePort>,
    manifest_port: Arc<dyn ManifestPort>,
    distribution_port: Arc<dyn DistributionPort>,
    materializer: Arc<MaterializeInteractor>,
    quality: Arc<QualityInteractor>,
    config: Arc<AnalyzerConfig>,
}

impl EstimateInteractor {
    /// Create new estimate interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        manifest_port: Arc<dyn ManifestPort>,
        distribution_port: Arc<dyn DistributionPort>,
        materializer: Arc<MaterializeInteractor>,
        quality: Arc<QualityInteractor>,
        config: Arc<AnalyzerConfig>,
    ) -> Self {
        Self {
            probe_port,
            manifest_port,
            distribution_port,
            materializer,
            quality,
            config,
        }
    }

    /// Run the whole estimation.
    ///
    /// The viewer distribution is checked before any external tool runs and
    /// the reference before any remote work starts. Every failure aborts the run.
    pub async fn execute(
        &self,
        request: &EstimateRequest,
        token: &CancellationToken,
    ) -> Result<EstimateReport, DomainError> {
        let started_at = Utc::now();
        request.validate()?;

        let distribution = self.distribution_port.load(&self.config.datafile).await?;
        distribution.validate()?;
        self.report_distribution(&distribution);

        let reference = guarded(token, self.probe_port.probe(&request.mezzanine)).await?;
        MediaValidator::validate_reference(&request.mezzanine.display().to_string(), &reference)?;
        info!("Reference: {}", reference);

        let mut variants = guarded(token, self.manifest_port.fetch_variants(&request.manifest_url)).await?;
        variants.sort_by_key(|variant| variant.bandwidth_bps);

        let renditions = self
            .materializer
            .materialize_ladder(&variants, &reference, token)
            .await?;

        let ladder: Vec<u64> = renditions.iter().map(|r| r.bandwidth_bps).collect();
        let rendition_shares = BandwidthBucketer::bucket(&ladder, &distribution.bandwidth_shares)?;
        Self::report_shares(&rendition_shares);

        info!("Preparing for VMAF");
        PathUtils::ensure_dir(&self.config.logs_dir).await?;
        let scratch = PathUtils::prepare_scratch(&self.config.work_dir).await?;

        let run = self
            .quality
            .estimate(
                &QualityRequest {
                    reference_path: &request.mezzanine,
                    reference: &reference,
                    renditions: &renditions,
                    rendition_shares: &rendition_shares,
                    resolution_shares: &distribution.resolution_shares,
                    scratch: &scratch,
                },
                token,
            )
            .await?;

        let average_vmaf = Aggregator::aggregate_with(
            &run.matrix,
            &rendition_shares,
            &distribution.resolution_shares,
            self.config.share_basis,
            self.config.skipped_cells,
        );
        info!(
            cells = run.cells.len(),
            share_basis = %self.config.share_basis,
            skipped_cells = %self.config.skipped_cells,
            "Average VMAF: {:.6}",
            average_vmaf
        );

        let ladder = renditions
            .iter()
            .enumerate()
            .map(|(index, rendition)| LadderEntry {
                index: index + 1,
                bandwidth_bps: rendition.bandwidth_bps,
                uri: rendition.source_uri.clone(),
                viewer_share: rendition_shares.get(index + 1),
            })
            .collect();

        Ok(EstimateReport {
            reference_width: reference.width,
            reference_height: reference.height,
            reference_frames: reference.effective_frame_count(),
            unplayable_share: rendition_shares.unplayable(),
            ladder,
            cells: run.cells,
            skipped_too_small: run.skipped_too_small,
            skipped_zero_share: run.skipped_zero_share,
            share_basis: self.config.share_basis,
            skipped_cells: self.config.skipped_cells,
            average_vmaf,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn report_distribution(&self, distribution: &ViewerDistribution) {
        let tolerance = self.config.distribution_sum_tolerance;
        let named = [
            ("Bandwidths", distribution.bandwidth_shares.len(), distribution.bandwidth_total()),
            ("Resolutions", distribution.resolution_buckets(), distribution.resolution_total()),
        ];
        for (name, len, sum) in named {
            info!("{} len: {} sum: {:.6}", name, len, sum);
            if (sum - 1.0).abs() > tolerance {
                warn!("{} shares sum to {:.6}, not 1.0", name, sum);
            }
        }
    }

    fn report_shares(shares: &RenditionShares) {
        for (index, share) in shares.as_slice().iter().enumerate() {
            if index == 0 {
                info!(
                    "{:.3} of users have insufficient bandwidth for *any* rendition to play smoothly",
                    share
                );
            } else {
                info!("{:.3} of users have sufficient bandwidth for rendition {}", share, index);
            }
        }
    }
}
