//! VMAF scorer adapter
//!
//! Drives `vmafossexec` against the two raw decode pipes and parses the JSON
//! log it writes.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::adapters::exec_ffmpeg::PIXEL_FORMAT;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::process::run_tool;

/// Pooling method requested from the scorer
pub const POOLING: &str = "harmonic_mean";

/// `vmafossexec`-based scorer
pub struct VmafossexecAdapter {
    program: String,
    model: PathBuf,
    threads: usize,
    subsample: u32,
}

impl VmafossexecAdapter {
    pub fn new(program: impl Into<String>, model: PathBuf, threads: usize, subsample: u32) -> Self {
        Self {
            program: program.into(),
            model,
            threads,
            subsample,
        }
    }

    fn args(&self, request: &ScoreRequest) -> Vec<String> {
        vec![
            PIXEL_FORMAT.to_string(),
            request.width.to_string(),
            request.height.to_string(),
            request.reference.to_string_lossy().into_owned(),
            request.distorted.to_string_lossy().into_owned(),
            self.model.to_string_lossy().into_owned(),
            "--log".to_string(),
            request.log_path.to_string_lossy().into_owned(),
            "--log-fmt".to_string(),
            "json".to_string(),
            "--thread".to_string(),
            self.threads.to_string(),
            "--subsample".to_string(),
            self.subsample.to_string(),
            "--pool".to_string(),
            POOLING.to_string(),
            "--psnr".to_string(),
            "--ssim".to_string(),
            "--ms-ssim".to_string(),
        ]
    }
}

#[async_trait]
impl ScorePort for VmafossexecAdapter {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreLog, DomainError> {
        let failed = |message: String| DomainError::ScoreToolFailed {
            width: request.width,
            height: request.height,
            message,
        };

        debug!(
            width = request.width,
            height = request.height,
            log = %request.log_path.display(),
            "Running VMAF"
        );
        let output = run_tool(&self.program, self.args(request))
            .await
            .map_err(|e| failed(e.to_string()))?;

        let raw = tokio::fs::read(&request.log_path).await.map_err(|e| {
            failed(format!(
                "Failed to read VMAF log {}: {}",
                request.log_path.display(),
                e
            ))
        })?;

        parse_vmaf_log(&raw).map_err(|e| {
            let stdout = String::from_utf8_lossy(&output.stdout);
            failed(format!("Failed to parse VMAF log: {} (scorer output: {})", e, stdout.trim()))
        })
    }
}

#[derive(Debug, Deserialize)]
struct VmafLog {
    #[serde(default)]
    version: Option<String>,
    frames: Vec<VmafFrame>,
}

#[derive(Debug, Deserialize)]
struct VmafFrame {
    #[serde(rename = "frameNum")]
    frame_num: u64,
    metrics: VmafMetrics,
}

#[derive(Debug, Deserialize)]
struct VmafMetrics {
    vmaf: f64,
    #[serde(default, alias = "psnr_y")]
    psnr: Option<f64>,
    #[serde(default, alias = "float_ssim")]
    ssim: Option<f64>,
    #[serde(default, alias = "float_ms_ssim")]
    ms_ssim: Option<f64>,
}

/// Parse a scorer JSON log into per-frame scores
pub fn parse_vmaf_log(raw: &[u8]) -> Result<ScoreLog, serde_json::Error> {
    let log: VmafLog = serde_json::from_slice(raw)?;
    Ok(ScoreLog {
        version: log.version,
        frames: log
            .frames
            .into_iter()
            .map(|frame| FrameScore {
                frame_num: frame.frame_num,
                vmaf: frame.metrics.vmaf,
                psnr: frame.metrics.psnr,
                ssim: frame.metrics.ssim,
                ms_ssim: frame.metrics.ms_ssim,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VMAFOSSEXEC_LOG: &str = r#"{
        "version": "1.3.15",
        "params": {"model": "vmaf_v0.6.1.pkl", "scaledWidth": 720, "scaledHeight": 404, "subsample": 30},
        "metrics": ["adm2", "motion2", "ms_ssim", "psnr", "ssim", "vif_scale0", "vmaf"],
        "frames": [
            {"frameNum": 0, "metrics": {"adm2": 0.97, "motion2": 0.0, "ms_ssim": 0.98, "psnr": 41.2, "ssim": 0.99, "vif_scale0": 0.8, "vmaf": 90.0}},
            {"frameNum": 30, "metrics": {"adm2": 0.91, "motion2": 3.1, "ms_ssim": 0.95, "psnr": 36.0, "ssim": 0.97, "vif_scale0": 0.7, "vmaf": 30.0}}
        ],
        "VMAF score": 45.0
    }"#;

    #[test]
    fn test_parse_vmafossexec_log() {
        let log = parse_vmaf_log(VMAFOSSEXEC_LOG.as_bytes()).unwrap();
        assert_eq!(log.version.as_deref(), Some("1.3.15"));
        assert_eq!(log.frames.len(), 2);
        assert_eq!(log.frames[1].frame_num, 30);
        assert_eq!(log.vmaf_scores(), vec![90.0, 30.0]);
        assert_eq!(log.frames[0].psnr, Some(41.2));
        assert_eq!(log.frames[0].ms_ssim, Some(0.98));
    }

    #[test]
    fn test_parse_libvmaf_style_metric_names() {
        let json = r#"{
            "frames": [{"frameNum": 0, "metrics": {"psnr_y": 40.0, "float_ssim": 0.9, "vmaf": 77.7}}]
        }"#;
        let log = parse_vmaf_log(json.as_bytes()).unwrap();
        assert_eq!(log.version, None);
        assert_eq!(log.frames[0].psnr, Some(40.0));
        assert_eq!(log.frames[0].ssim, Some(0.9));
    }

    #[test]
    fn test_parse_rejects_log_without_vmaf() {
        let json = r#"{"frames": [{"frameNum": 0, "metrics": {"psnr": 40.0}}]}"#;
        assert!(parse_vmaf_log(json.as_bytes()).is_err());
        assert!(parse_vmaf_log(b"").is_err());
    }

    #[test]
    fn test_args_follow_positional_contract() {
        let adapter = VmafossexecAdapter::new("vmafossexec", PathBuf::from("model/vmaf_v0.6.1.pkl"), 8, 30);
        let request = ScoreRequest {
            reference: PathBuf::from("/tmp/reference.yuv"),
            distorted: PathBuf::from("/tmp/distorted.yuv"),
            width: 720,
            height: 404,
            log_path: PathBuf::from("logs/1_720_404.log"),
        };
        let args = adapter.args(&request);
        assert_eq!(
            &args[..6],
            &[
                "yuv420p",
                "720",
                "404",
                "/tmp/reference.yuv",
                "/tmp/distorted.yuv",
                "model/vmaf_v0.6.1.pkl"
            ]
        );
        let joined = args.join(" ");
        assert!(joined.contains("--log logs/1_720_404.log --log-fmt json"));
        assert!(joined.contains("--thread 8"));
        assert!(joined.contains("--subsample 30"));
        assert!(joined.contains("--pool harmonic_mean"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_score_reads_log_after_tool_exits() {
        let temp = tempfile::tempdir().unwrap();
        let log_path = temp.path().join("0_720_404.log");
        std::fs::write(&log_path, VMAFOSSEXEC_LOG).unwrap();

        let request = ScoreRequest {
            reference: PathBuf::from("ref.yuv"),
            distorted: PathBuf::from("dist.yuv"),
            width: 720,
            height: 404,
            log_path,
        };
        let log = VmafossexecAdapter::new("true", PathBuf::from("model.pkl"), 1, 1)
            .score(&request)
            .await
            .unwrap();
        assert_eq!(log.frames.len(), 2);

        let err = VmafossexecAdapter::new("false", PathBuf::from("model.pkl"), 1, 1)
            .score(&request)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ScoreToolFailed { width: 720, height: 404, .. }));
    }

    #[tokio::test]
    async fn test_missing_log_is_score_failure() {
        let temp = tempfile::tempdir().unwrap();
        let request = ScoreRequest {
            reference: PathBuf::from("ref.yuv"),
            distorted: PathBuf::from("dist.yuv"),
            width: 320,
            height: 180,
            log_path: temp.path().join("missing.log"),
        };
        let err = VmafossexecAdapter::new("no-such-vmaf-binary-4be1", PathBuf::from("m.pkl"), 1, 1)
            .score(&request)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("320"));
    }
}
