//! FFmpeg execution adapter
//!
//! Stream-copies ladder variants to local files and decodes media to raw
//! yuv420p at the size of a quality cell.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;
use crate::utils::process::run_tool;

/// Raw pixel format shared by the decoder and the scorer
pub const PIXEL_FORMAT: &str = "yuv420p";

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    program: String,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn remux_args(source_uri: &str, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            source_uri.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    fn decode_args(input: &Path, output: &Path, width: u64, height: u64) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vf".to_string(),
            format!("scale={}:{}", width, height),
            "-pix_fmt".to_string(),
            PIXEL_FORMAT.to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl RemuxPort for FFmpegAdapter {
    async fn remux(&self, source_uri: &str, output: &Path) -> Result<(), DomainError> {
        debug!(uri = source_uri, output = %output.display(), "Copying variant stream");
        run_tool(&self.program, Self::remux_args(source_uri, output))
            .await
            .map(|_| ())
            .map_err(|e| DomainError::MaterializeFailed {
                uri: source_uri.to_string(),
                message: format!("Error running ffmpeg dump: {}", e),
            })
    }
}

#[async_trait]
impl DecodePort for FFmpegAdapter {
    async fn decode(
        &self,
        input: &Path,
        output: &Path,
        width: u64,
        height: u64,
    ) -> Result<(), DomainError> {
        debug!(input = %input.display(), width, height, "Decoding");
        run_tool(&self.program, Self::decode_args(input, output, width, height))
            .await
            .map(|_| ())
            .map_err(|e| DomainError::DecodeFailed {
                input: input.display().to_string(),
                width,
                height,
                message: e.to_string(),
            })
    }
}
