//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output over the file's video streams and, unless
//! disabled, dumps every frame of the primary stream to recover its timestamp
//! sequence.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::process::run_tool;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    program: String,
    show_frames: bool,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(program: impl Into<String>, show_frames: bool) -> Self {
        Self {
            program: program.into(),
            show_frames,
        }
    }

    fn args(&self, path: &Path) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_streams".to_string(),
        ];
        if self.show_frames {
            args.push("-show_frames".to_string());
        }
        args.push("-select_streams".to_string());
        args.push("v".to_string());
        args.push(path.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, DomainError> {
        let shown = path.display().to_string();
        let output = run_tool(&self.program, self.args(path))
            .await
            .map_err(|e| DomainError::ProbeFailed {
                path: shown.clone(),
                message: e.to_string(),
            })?;

        let info = parse_probe_output(&output.stdout, self.show_frames).map_err(|message| {
            DomainError::ProbeFailed {
                path: shown.clone(),
                message,
            }
        })?;
        debug!(path = %shown, %info, streams = info.video_stream_count, "Probed media");
        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    #[serde(default)]
    streams: Vec<FFprobeStream>,
    #[serde(default)]
    frames: Vec<FFprobeFrame>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    #[serde(default)]
    index: Option<u64>,
    #[serde(default)]
    width: u64,
    #[serde(default)]
    height: u64,
    /// ffprobe reports this as a decimal string, or omits it
    #[serde(default)]
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFrame {
    #[serde(default)]
    stream_index: Option<u64>,
    #[serde(default)]
    pts: Option<i64>,
    /// Older ffprobe releases only report the packet timestamp
    #[serde(default)]
    pkt_pts: Option<i64>,
    #[serde(default)]
    best_effort_timestamp: Option<i64>,
}

impl FFprobeFrame {
    fn timestamp(&self) -> i64 {
        self.pts
            .or(self.pkt_pts)
            .or(self.best_effort_timestamp)
            .unwrap_or(NO_PTS)
    }
}

/// Parse `ffprobe -print_format json` output into the primary stream's metadata.
///
/// The first listed stream is the primary one; only its frames contribute to the
/// timestamp sequence.
pub fn parse_probe_output(stdout: &[u8], with_frames: bool) -> Result<MediaInfo, String> {
    let probe: FFprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| format!("Failed to unmarshal probe response: '{}'", e))?;

    let Some(primary) = probe.streams.first() else {
        return Ok(MediaInfo {
            frame_timestamps: with_frames.then(Vec::new),
            ..MediaInfo::default()
        });
    };

    let frame_count = match primary.nb_frames.as_deref() {
        None | Some("N/A") => 0,
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid nb_frames '{}': {}", raw, e))?,
    };

    let frame_timestamps = with_frames.then(|| {
        probe
            .frames
            .iter()
            .filter(|frame| match (frame.stream_index, primary.index) {
                (Some(frame_stream), Some(primary_stream)) => frame_stream == primary_stream,
                _ => true,
            })
            .map(FFprobeFrame::timestamp)
            .collect()
    });

    Ok(MediaInfo {
        width: primary.width,
        height: primary.height,
        frame_count,
        frame_timestamps,
        video_stream_count: probe.streams.len(),
    })
}
