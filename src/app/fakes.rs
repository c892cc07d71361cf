// Test doubles for the ports - canned results plus a record of every call

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Single-stream media with one timestamp per frame
pub fn media(width: u64, height: u64, frames: u64) -> MediaInfo {
    MediaInfo {
        width,
        height,
        frame_count: frames,
        frame_timestamps: Some((0..frames as i64).collect()),
        video_stream_count: 1,
    }
}

/// Returns `default` for every path except the overridden ones
pub struct FakeProbe {
    default: MediaInfo,
    overrides: HashMap<PathBuf, MediaInfo>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeProbe {
    pub fn new(default: MediaInfo) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, path: PathBuf, info: MediaInfo) -> Self {
        self.overrides.insert(path, info);
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProbePort for FakeProbe {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, DomainError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        Ok(self.overrides.get(path).cloned().unwrap_or_else(|| self.default.clone()))
    }
}

#[derive(Default)]
pub struct FakeRemux {
    fail: bool,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeRemux {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemuxPort for FakeRemux {
    async fn remux(&self, source_uri: &str, output: &Path) -> Result<(), DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((source_uri.to_string(), output.to_path_buf()));
        if self.fail {
            return Err(DomainError::MaterializeFailed {
                uri: source_uri.to_string(),
                message: "Error running ffmpeg dump: exit status 1".to_string(),
            });
        }
        Ok(())
    }
}

/// How a fake decode behaves
#[derive(Default, Clone, Copy)]
pub enum DecodeBehavior {
    #[default]
    Succeed,
    Fail,
    /// Never finish on its own, like a decoder blocked on a pipe nobody reads
    Hang,
}

#[derive(Default)]
pub struct FakeDecode {
    behavior: DecodeBehavior,
    calls: Mutex<Vec<(PathBuf, PathBuf, u64, u64)>>,
    finished: AtomicUsize,
}

impl FakeDecode {
    pub fn new(behavior: DecodeBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, u64, u64)> {
        self.calls.lock().unwrap().clone()
    }

    /// Decodes that ran to completion
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecodePort for FakeDecode {
    async fn decode(
        &self,
        input: &Path,
        output: &Path,
        width: u64,
        height: u64,
    ) -> Result<(), DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf(), width, height));
        match self.behavior {
            DecodeBehavior::Succeed => {}
            DecodeBehavior::Fail => {
                return Err(DomainError::DecodeFailed {
                    input: input.display().to_string(),
                    width,
                    height,
                    message: "ffmpeg exited with 1: Invalid data found when processing input"
                        .to_string(),
                })
            }
            DecodeBehavior::Hang => tokio::time::sleep(Duration::from_secs(3600)).await,
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scores each target size with canned per-frame values
pub struct FakeScore {
    default_frames: Vec<f64>,
    frames_by_size: HashMap<(u64, u64), Vec<f64>>,
    fail: bool,
    calls: Mutex<Vec<ScoreRequest>>,
}

impl FakeScore {
    pub fn new(default_frames: Vec<f64>) -> Self {
        Self {
            default_frames,
            frames_by_size: HashMap::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with(mut self, width: u64, height: u64, frames: Vec<f64>) -> Self {
        self.frames_by_size.insert((width, height), frames);
        self
    }

    pub fn calls(&self) -> Vec<ScoreRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScorePort for FakeScore {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreLog, DomainError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(DomainError::ScoreToolFailed {
                width: request.width,
                height: request.height,
                message: "vmafossexec exited with 255: model file not found".to_string(),
            });
        }
        let frames = self
            .frames_by_size
            .get(&(request.width, request.height))
            .unwrap_or(&self.default_frames);
        Ok(ScoreLog {
            version: Some("fake".to_string()),
            frames: frames
                .iter()
                .enumerate()
                .map(|(i, vmaf)| FrameScore {
                    frame_num: i as u64,
                    vmaf: *vmaf,
                    ..FrameScore::default()
                })
                .collect(),
        })
    }
}

pub struct FakeManifest {
    variants: Vec<VariantSource>,
    calls: AtomicUsize,
}

impl FakeManifest {
    pub fn new(bandwidths: &[u64]) -> Self {
        Self {
            variants: bandwidths
                .iter()
                .map(|bandwidth| VariantSource {
                    uri: format!("https://cdn.example.com/{}/index.m3u8", bandwidth),
                    bandwidth_bps: *bandwidth,
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestPort for FakeManifest {
    async fn fetch_variants(&self, _manifest_url: &str) -> Result<Vec<VariantSource>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.variants.clone())
    }
}

/// Hands out a distribution without validating it, like a file on disk
pub struct FakeDistribution {
    distribution: ViewerDistribution,
}

impl FakeDistribution {
    pub fn new(bandwidth_shares: Vec<f64>, resolution_shares: Vec<f64>) -> Self {
        Self {
            distribution: ViewerDistribution {
                resolution_shares,
                bandwidth_shares,
            },
        }
    }
}

#[async_trait]
impl DistributionPort for FakeDistribution {
    async fn load(&self, _path: &Path) -> Result<ViewerDistribution, DomainError> {
        self.distribution.validate()?;
        Ok(self.distribution.clone())
    }
}
