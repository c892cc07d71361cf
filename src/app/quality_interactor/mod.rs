// Quality interactor - Scores every (rendition, resolution bucket) cell viewers can see

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::{ResolutionScaler, ScoreReducer};
use crate::ports::*;
use crate::utils::cancel::join3_or_cancel;
use crate::utils::logging::ProgressReporter;
use crate::utils::path::{PathUtils, ScratchPaths};
use crate::utils::Utils;

/// Knobs of the cell loop
#[derive(Debug, Clone)]
pub struct QualitySettings {
    pub min_resolution: u64,
    pub low_score_threshold: f64,
    pub logs_dir: PathBuf,
}

/// Inputs for one quality estimation pass
pub struct QualityRequest<'a> {
    pub reference_path: &'a Path,
    pub reference: &'a MediaInfo,
    pub renditions: &'a [Rendition],
    pub rendition_shares: &'a RenditionShares,
    pub resolution_shares: &'a [f64],
    pub scratch: &'a ScratchPaths,
}

/// Result of a quality estimation pass
#[derive(Debug, Clone)]
pub struct QualityRun {
    pub matrix: QualityMatrix,
    pub cells: Vec<QualityCell>,
    pub skipped_too_small: usize,
    pub skipped_zero_share: usize,
}

/// Interactor for the quality estimation use case
pub struct QualityInteractor {
    decode_port: Arc<dyn DecodePort>,
    score_port: Arc<dyn ScorePort>,
    settings: QualitySettings,
}

impl QualityInteractor {
    /// Create new quality interactor with injected ports
    pub fn new(
        decode_port: Arc<dyn DecodePort>,
        score_port: Arc<dyn ScorePort>,
        settings: QualitySettings,
    ) -> Self {
        Self {
            decode_port,
            score_port,
            settings,
        }
    }

    /// Fill the quality matrix, one cell at a time.
    ///
    /// Renditions are visited in ladder order and buckets in ascending width.
    /// Both scratch pipes are shared by every cell, so cells never overlap.
    /// Any cell failure aborts the pass.
    pub async fn estimate(
        &self,
        request: &QualityRequest<'_>,
        run_token: &CancellationToken,
    ) -> Result<QualityRun, DomainError> {
        let plan = ResolutionScaler::plan(
            request.resolution_shares,
            request.reference.width,
            request.reference.height,
            self.settings.min_resolution,
        );
        let rows = request.renditions.len() + 1;
        let mut run = QualityRun {
            matrix: QualityMatrix::new(rows, plan.len()),
            cells: Vec::new(),
            skipped_too_small: 0,
            skipped_zero_share: 0,
        };

        let playable_rows = (1..rows)
            .filter(|row| request.rendition_shares.get(*row) != 0.0)
            .count();
        let targets = plan.iter().filter(|p| p.is_target()).count();
        let large_enough = plan
            .iter()
            .filter(|p| !matches!(p, BucketPlan::TooSmall { .. }))
            .count();
        let mut progress = ProgressReporter::new(playable_rows * targets);

        for (ladder_index, rendition) in request.renditions.iter().enumerate() {
            let row = ladder_index + 1;
            if request.rendition_shares.get(row) == 0.0 {
                debug!(rendition = row, "Skipping rendition - zero viewer share");
                run.skipped_zero_share += large_enough;
                continue;
            }

            for (bucket, bucket_plan) in plan.iter().enumerate() {
                let (width, height) = match *bucket_plan {
                    BucketPlan::TooSmall { width, height } => {
                        info!("Skipping resolution {}x{} - too small for VMAF", width, height);
                        run.skipped_too_small += 1;
                        continue;
                    }
                    BucketPlan::ZeroShare { width, height } => {
                        debug!(
                            "Skipping resolution {}x{} - no viewers watch at this width",
                            width, height
                        );
                        run.skipped_zero_share += 1;
                        continue;
                    }
                    BucketPlan::Target { width, height } => (width, height),
                };

                if run_token.is_cancelled() {
                    return Err(DomainError::Cancelled);
                }

                let score = self
                    .score_cell(request, ladder_index, rendition, width, height, run_token)
                    .await?;
                let cell = QualityCell {
                    rendition_index: row,
                    resolution_bucket: bucket,
                    target_width: width,
                    target_height: height,
                    score,
                };
                run.matrix.insert(&cell)?;
                info!(
                    rendition = row,
                    width,
                    height,
                    score,
                    bitrate_share = request.rendition_shares.get(row),
                    resolution_share = request.resolution_shares[bucket],
                    "VMAF harmonic mean"
                );
                run.cells.push(cell);
                progress.cell_done(&format!("rendition {} at {}x{}", row, width, height));
            }
        }

        info!(
            "Scored {} cells in {}",
            progress.completed(),
            Utils::format_duration(progress.elapsed())
        );
        Ok(run)
    }

    /// Decode both sides into the scratch pipes while the scorer reads them,
    /// then reduce the scorer's frames to one figure.
    async fn score_cell(
        &self,
        request: &QualityRequest<'_>,
        ladder_index: usize,
        rendition: &Rendition,
        width: u64,
        height: u64,
        run_token: &CancellationToken,
    ) -> Result<f64, DomainError> {
        info!("Calculating VMAF score at {}x{}", width, height);

        let cell_token = run_token.child_token();
        let score_request = ScoreRequest {
            reference: request.scratch.reference.clone(),
            distorted: request.scratch.distorted.clone(),
            width,
            height,
            log_path: PathUtils::cell_log(&self.settings.logs_dir, ladder_index, width, height),
        };

        let (_, _, log) = join3_or_cancel(
            &cell_token,
            self.decode_port.decode(
                request.reference_path,
                &request.scratch.reference,
                width,
                height,
            ),
            self.decode_port.decode(
                &rendition.local_path,
                &request.scratch.distorted,
                width,
                height,
            ),
            self.score_port.score(&score_request),
        )
        .await?;

        let score = ScoreReducer::harmonic_mean(&log.vmaf_scores()).ok_or_else(|| {
            DomainError::ScoreToolFailed {
                width,
                height,
                message: format!("{} contains no frames", score_request.log_path.display()),
            }
        })?;

        if score < self.settings.low_score_threshold {
            return Err(DomainError::LowScoreDetected {
                score,
                threshold: self.settings.low_score_threshold,
            });
        }
        Ok(score)
    }
}
