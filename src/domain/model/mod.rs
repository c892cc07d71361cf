// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Number of entries a bandwidth distribution must carry
pub const BANDWIDTH_BUCKETS: usize = 100;

/// Width of one bandwidth bucket in bits per second (100 kbps)
pub const BANDWIDTH_BUCKET_BPS: u64 = 100_000;

/// Width of one resolution bucket in pixels
pub const RESOLUTION_BUCKET_PX: u64 = 16;

/// Marker stored for frames the prober reported without a timestamp.
/// Matches ffmpeg's `AV_NOPTS_VALUE`.
pub const NO_PTS: i64 = i64::MIN;

/// Structural metadata of a media file's primary video stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub width: u64,
    pub height: u64,
    /// Frame count as declared by the container (0 when unknown)
    pub frame_count: u64,
    /// Per-frame presentation timestamps, present when frames were probed
    pub frame_timestamps: Option<Vec<i64>>,
    /// Number of video streams found in the file
    pub video_stream_count: usize,
}

impl MediaInfo {
    /// Frame count used for reference/rendition comparison.
    ///
    /// The timestamp sequence is authoritative when it was probed; container
    /// frame counts are frequently missing for transport streams.
    pub fn effective_frame_count(&self) -> u64 {
        match &self.frame_timestamps {
            Some(timestamps) => timestamps.len() as u64,
            None => self.frame_count,
        }
    }

    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}, {} frames",
            self.width,
            self.height,
            self.effective_frame_count()
        )
    }
}

/// One variant entry of a master playlist, before it is materialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSource {
    pub uri: String,
    pub bandwidth_bps: u64,
}

/// A ladder rendition that has been copied locally and validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub source_uri: String,
    pub bandwidth_bps: u64,
    pub local_path: PathBuf,
    pub info: MediaInfo,
}

/// Viewer bandwidth and display-width distributions
///
/// Bandwidth bucket `i` holds the share of viewers whose bandwidth falls in
/// `[i * 100kbps, (i + 1) * 100kbps)`. Resolution bucket `j` holds the share of
/// viewers watching at a width of `(j + 1) * 16` pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerDistribution {
    #[serde(rename = "resolution_pcts")]
    pub resolution_shares: Vec<f64>,
    #[serde(rename = "bandwidth_pcts")]
    pub bandwidth_shares: Vec<f64>,
}

impl ViewerDistribution {
    /// Create a distribution, rejecting malformed share vectors
    pub fn new(bandwidth_shares: Vec<f64>, resolution_shares: Vec<f64>) -> Result<Self, DomainError> {
        let distribution = Self {
            resolution_shares,
            bandwidth_shares,
        };
        distribution.validate()?;
        Ok(distribution)
    }

    /// Check the bucket count and that every share is a finite, non-negative number
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.bandwidth_shares.len() != BANDWIDTH_BUCKETS {
            return Err(DomainError::DistributionFormat(format!(
                "expected {} bandwidth entries but got {}",
                BANDWIDTH_BUCKETS,
                self.bandwidth_shares.len()
            )));
        }

        let named = [
            ("bandwidth", &self.bandwidth_shares),
            ("resolution", &self.resolution_shares),
        ];
        for (name, shares) in named {
            if let Some((index, value)) = shares
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(DomainError::DistributionFormat(format!(
                    "{} share at index {} must be a non-negative number, got {}",
                    name, index, value
                )));
            }
        }

        Ok(())
    }

    pub fn bandwidth_total(&self) -> f64 {
        self.bandwidth_shares.iter().sum()
    }

    pub fn resolution_total(&self) -> f64 {
        self.resolution_shares.iter().sum()
    }

    pub fn resolution_buckets(&self) -> usize {
        self.resolution_shares.len()
    }
}

/// Viewer share per rendition; index 0 holds viewers who cannot play any rendition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionShares(Vec<f64>);

impl RenditionShares {
    pub fn new(shares: Vec<f64>) -> Self {
        Self(shares)
    }

    /// Share of viewers with insufficient bandwidth for any rendition
    pub fn unplayable(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Share of viewers able to play at least one rendition
    pub fn playable(&self) -> f64 {
        self.0.iter().skip(1).sum()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// One scored (rendition, resolution bucket) pair
///
/// `rendition_index` is in matrix coordinates: 1 is the lowest-bandwidth
/// rendition, 0 is reserved for the unplayable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCell {
    pub rendition_index: usize,
    pub resolution_bucket: usize,
    pub target_width: u64,
    pub target_height: u64,
    pub score: f64,
}

/// Dense rendition x resolution-bucket score matrix
///
/// Cells that were never computed read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMatrix {
    rows: usize,
    buckets: usize,
    scores: Vec<f64>,
    computed: Vec<bool>,
}

impl QualityMatrix {
    /// Create an all-zero matrix with `rows` renditions (including row 0)
    pub fn new(rows: usize, buckets: usize) -> Self {
        Self {
            rows,
            buckets,
            scores: vec![0.0; rows * buckets],
            computed: vec![false; rows * buckets],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Record a computed cell. Out-of-range cells are a programming error.
    pub fn insert(&mut self, cell: &QualityCell) -> Result<(), DomainError> {
        let offset = self.offset(cell.rendition_index, cell.resolution_bucket).ok_or_else(|| {
            DomainError::BadArgs(format!(
                "cell ({}, {}) outside a {}x{} quality matrix",
                cell.rendition_index, cell.resolution_bucket, self.rows, self.buckets
            ))
        })?;
        self.scores[offset] = cell.score;
        self.computed[offset] = true;
        Ok(())
    }

    pub fn score(&self, rendition: usize, bucket: usize) -> f64 {
        self.offset(rendition, bucket)
            .map(|offset| self.scores[offset])
            .unwrap_or(0.0)
    }

    pub fn is_computed(&self, rendition: usize, bucket: usize) -> bool {
        self.offset(rendition, bucket)
            .map(|offset| self.computed[offset])
            .unwrap_or(false)
    }

    pub fn computed_count(&self) -> usize {
        self.computed.iter().filter(|c| **c).count()
    }

    /// Multiply every score by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = self.clone();
        scaled.scores.iter_mut().for_each(|s| *s *= factor);
        scaled
    }

    fn offset(&self, rendition: usize, bucket: usize) -> Option<usize> {
        (rendition < self.rows && bucket < self.buckets).then(|| rendition * self.buckets + bucket)
    }
}

/// Per-frame metrics parsed from a scorer log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameScore {
    pub frame_num: u64,
    pub vmaf: f64,
    pub psnr: Option<f64>,
    pub ssim: Option<f64>,
    pub ms_ssim: Option<f64>,
}

/// Parsed scorer log for one quality cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreLog {
    pub version: Option<String>,
    pub frames: Vec<FrameScore>,
}

impl ScoreLog {
    pub fn vmaf_scores(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.vmaf).collect()
    }
}

/// How a resolution bucket is handled by the quality estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketPlan {
    /// Score the bucket at this size
    Target { width: u64, height: u64 },
    /// Either dimension is below the minimum viable resolution
    TooSmall { width: u64, height: u64 },
    /// No viewer watches at this width
    ZeroShare { width: u64, height: u64 },
}

impl BucketPlan {
    pub fn dimensions(&self) -> (u64, u64) {
        match *self {
            BucketPlan::Target { width, height }
            | BucketPlan::TooSmall { width, height }
            | BucketPlan::ZeroShare { width, height } => (width, height),
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, BucketPlan::Target { .. })
    }
}

/// Population the final figure is averaged over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareBasis {
    /// Every viewer; viewers who cannot play anything count as 0
    #[default]
    #[serde(alias = "all")]
    AllViewers,
    /// Only viewers with bandwidth for at least one rendition
    #[serde(alias = "playable")]
    PlayableViewers,
}

impl FromStr for ShareBasis {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "all_viewers" => Ok(ShareBasis::AllViewers),
            "playable" | "playable_viewers" => Ok(ShareBasis::PlayableViewers),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid share basis: {}. Valid values: all, playable",
                s
            ))),
        }
    }
}

impl fmt::Display for ShareBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareBasis::AllViewers => write!(f, "all"),
            ShareBasis::PlayableViewers => write!(f, "playable"),
        }
    }
}

/// Treatment of cells that were skipped rather than scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedCells {
    /// Skipped cells stay in the weighted sum with a score of 0
    #[default]
    #[serde(alias = "zero")]
    CountAsZero,
    /// Weights are renormalized over computed cells only
    Exclude,
}

impl FromStr for SkippedCells {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" | "count_as_zero" => Ok(SkippedCells::CountAsZero),
            "exclude" => Ok(SkippedCells::Exclude),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid skipped-cell policy: {}. Valid values: zero, exclude",
                s
            ))),
        }
    }
}

impl fmt::Display for SkippedCells {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkippedCells::CountAsZero => write!(f, "zero"),
            SkippedCells::Exclude => write!(f, "exclude"),
        }
    }
}

/// Ladder entry as it appears in the final report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderEntry {
    pub index: usize,
    pub bandwidth_bps: u64,
    pub uri: String,
    pub viewer_share: f64,
}

/// Summary of one estimation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub reference_width: u64,
    pub reference_height: u64,
    pub reference_frames: u64,
    pub unplayable_share: f64,
    pub ladder: Vec<LadderEntry>,
    pub cells: Vec<QualityCell>,
    pub skipped_too_small: usize,
    pub skipped_zero_share: usize,
    pub share_basis: ShareBasis,
    pub skipped_cells: SkippedCells,
    pub average_vmaf: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
