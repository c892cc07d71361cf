// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Business rules for stream topology and frame alignment
pub struct MediaValidator;

impl MediaValidator {
    /// Validate the reference (mezzanine) file: one video stream with real dimensions
    pub fn validate_reference(path: &str, info: &MediaInfo) -> Result<(), DomainError> {
        Self::require_single_video_stream(path, info)?;

        if !info.has_dimensions() {
            return Err(DomainError::InvalidMedia {
                path: path.to_string(),
                message: format!(
                    "must have a valid width and height, but has {}x{}",
                    info.width, info.height
                ),
            });
        }

        Ok(())
    }

    /// Validate a materialized rendition against the reference.
    ///
    /// Frame-aligned scoring is meaningless if a rendition dropped or
    /// duplicated frames, so the frame counts must match exactly.
    pub fn validate_rendition(
        uri: &str,
        rendition: &MediaInfo,
        reference: &MediaInfo,
    ) -> Result<(), DomainError> {
        Self::require_single_video_stream(uri, rendition)?;

        let expected = reference.effective_frame_count();
        let actual = rendition.effective_frame_count();
        if expected != actual {
            return Err(DomainError::MaterializeFailed {
                uri: uri.to_string(),
                message: format!(
                    "variant frame count doesn't match reference frame count: {} != {}",
                    actual, expected
                ),
            });
        }

        Ok(())
    }

    fn require_single_video_stream(path: &str, info: &MediaInfo) -> Result<(), DomainError> {
        if info.video_stream_count != 1 {
            return Err(DomainError::InvalidMedia {
                path: path.to_string(),
                message: format!(
                    "must have exactly 1 video stream, but had {}",
                    info.video_stream_count
                ),
            });
        }
        Ok(())
    }
}

/// Maps the 100kbps bandwidth buckets onto the rendition ladder
pub struct BandwidthBucketer;

impl BandwidthBucketer {
    /// Compute the viewer share for every rendition.
    ///
    /// `ladder` holds rendition bandwidths in ascending order. The result has
    /// `ladder.len() + 1` entries; entry 0 collects viewers who cannot sustain
    /// even the lowest rendition. A bucket whose lower bound equals a
    /// rendition's bandwidth is attributed to that rendition.
    pub fn bucket(ladder: &[u64], bandwidth_shares: &[f64]) -> Result<RenditionShares, DomainError> {
        if bandwidth_shares.len() != BANDWIDTH_BUCKETS {
            return Err(DomainError::DistributionFormat(format!(
                "expected {} bandwidth entries but got {}",
                BANDWIDTH_BUCKETS,
                bandwidth_shares.len()
            )));
        }
        if ladder.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(DomainError::BadArgs(
                "rendition ladder must be sorted by ascending bandwidth".to_string(),
            ));
        }

        let mut shares = vec![0.0; ladder.len() + 1];
        let mut cursor = 0;
        for (bucket, share) in bandwidth_shares.iter().enumerate() {
            let lower_bound = bucket as u64 * BANDWIDTH_BUCKET_BPS;
            while cursor < ladder.len() && lower_bound >= ladder[cursor] {
                cursor += 1;
            }
            shares[cursor] += share;
        }

        Ok(RenditionShares::new(shares))
    }
}

/// Maps resolution buckets to concrete target dimensions
pub struct ResolutionScaler;

impl ResolutionScaler {
    /// Height preserving the reference aspect ratio, rounded down to an even number.
    ///
    /// 4:2:0 chroma subsampling requires even dimensions.
    pub fn width_to_height(width: u64, reference_width: u64, reference_height: u64) -> u64 {
        if reference_width == 0 {
            return 0;
        }
        let height = (u128::from(width) * u128::from(reference_height)) / u128::from(reference_width);
        (height as u64) & !1
    }

    /// Display width represented by a resolution bucket
    pub fn bucket_width(bucket: usize) -> u64 {
        (bucket as u64 + 1) * RESOLUTION_BUCKET_PX
    }

    /// Classify every resolution bucket for the given reference size
    pub fn plan(
        resolution_shares: &[f64],
        reference_width: u64,
        reference_height: u64,
        min_resolution: u64,
    ) -> Vec<BucketPlan> {
        resolution_shares
            .iter()
            .enumerate()
            .map(|(bucket, share)| {
                let width = Self::bucket_width(bucket);
                let height = Self::width_to_height(width, reference_width, reference_height);
                if width < min_resolution || height < min_resolution {
                    BucketPlan::TooSmall { width, height }
                } else if *share == 0.0 {
                    BucketPlan::ZeroShare { width, height }
                } else {
                    BucketPlan::Target { width, height }
                }
            })
            .collect()
    }
}

/// Reduction of per-frame scores to one figure
pub struct ScoreReducer;

impl ScoreReducer {
    /// Harmonic mean of the per-frame scores.
    ///
    /// Returns `None` for an empty sequence. A frame scoring exactly 0 drives
    /// the harmonic mean to 0; negative frames pull it below 0.
    pub fn harmonic_mean(scores: &[f64]) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        if scores.iter().any(|s| *s == 0.0) {
            return Some(0.0);
        }
        let reciprocal_sum: f64 = scores.iter().map(|s| 1.0 / s).sum();
        Some(scores.len() as f64 / reciprocal_sum)
    }
}

/// Weighted reduction of the quality matrix into one expected viewer score
pub struct Aggregator;

impl Aggregator {
    /// `sum_i sum_j q[i][j] * r[i] * s[j]` over every rendition (row 0 included)
    /// and every resolution bucket.
    pub fn aggregate(
        matrix: &QualityMatrix,
        rendition_shares: &RenditionShares,
        resolution_shares: &[f64],
    ) -> f64 {
        let mut total = 0.0;
        for (i, bitrate_share) in rendition_shares.as_slice().iter().enumerate() {
            for (j, resolution_share) in resolution_shares.iter().enumerate() {
                total += matrix.score(i, j) * bitrate_share * resolution_share;
            }
        }
        total
    }

    /// Aggregate under the configured population and skipped-cell policies
    pub fn aggregate_with(
        matrix: &QualityMatrix,
        rendition_shares: &RenditionShares,
        resolution_shares: &[f64],
        share_basis: ShareBasis,
        skipped_cells: SkippedCells,
    ) -> f64 {
        let weighted = Self::aggregate(matrix, rendition_shares, resolution_shares);

        let denominator = match skipped_cells {
            SkippedCells::Exclude => Self::computed_weight(matrix, rendition_shares, resolution_shares),
            SkippedCells::CountAsZero => match share_basis {
                ShareBasis::AllViewers => return weighted,
                ShareBasis::PlayableViewers => rendition_shares.playable(),
            },
        };

        if denominator <= 0.0 {
            0.0
        } else {
            weighted / denominator
        }
    }

    /// Total weight carried by cells that were actually scored.
    ///
    /// Row 0 is never computed, so this is already restricted to playable viewers.
    fn computed_weight(
        matrix: &QualityMatrix,
        rendition_shares: &RenditionShares,
        resolution_shares: &[f64],
    ) -> f64 {
        let mut weight = 0.0;
        for (i, bitrate_share) in rendition_shares.as_slice().iter().enumerate() {
            for (j, resolution_share) in resolution_shares.iter().enumerate() {
                if matrix.is_computed(i, j) {
                    weight += bitrate_share * resolution_share;
                }
            }
        }
        weight
    }
}
