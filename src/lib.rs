//! ladder-vmaf library
//!
//! Estimates the video quality the average viewer of an HLS encoding ladder
//! actually experiences. Every rendition is scored with VMAF at every display
//! width viewers use, and the scores are weighted by real viewer bandwidth and
//! display-width distributions.
//!
//! Decoding and scoring are delegated to `ffprobe`, `ffmpeg` and `vmafossexec`;
//! the crate drives those tools and does the bucketing and aggregation.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use config::AnalyzerConfig;
pub use domain::errors::DomainError;
pub use domain::model::{EstimateReport, MediaInfo, ShareBasis, SkippedCells, ViewerDistribution};
pub use domain::rules::{Aggregator, BandwidthBucketer, ResolutionScaler, ScoreReducer};
