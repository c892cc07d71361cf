use std::sync::Arc;

use crate::adapters::{
    FFmpegAdapter, FFprobeAdapter, HttpManifestAdapter, JsonDistributionAdapter, VmafossexecAdapter,
};
use crate::app::{
    estimate_interactor::EstimateInteractor,
    materialize_interactor::MaterializeInteractor,
    quality_interactor::{QualityInteractor, QualitySettings},
};
use crate::config::AnalyzerConfig;
use crate::domain::errors::DomainError;
use crate::ports::{DecodePort, DistributionPort, ManifestPort, ProbePort, RemuxPort, ScorePort};

pub trait AppContainer: Send + Sync {
    fn estimate_interactor(&self) -> Arc<EstimateInteractor>;
    fn config(&self) -> Arc<AnalyzerConfig>;
}

pub struct DefaultAppContainer {
    estimate_interactor: Arc<EstimateInteractor>,
    config: Arc<AnalyzerConfig>,
}

impl DefaultAppContainer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, DomainError> {
        config.validate()?;
        let config = Arc::new(config);

        let probe_port = Arc::new(FFprobeAdapter::new(config.ffprobe.clone(), config.probe_frames));
        let ffmpeg = Arc::new(FFmpegAdapter::new(config.ffmpeg.clone()));
        let score_port = Arc::new(VmafossexecAdapter::new(
            config.vmafossexec.clone(),
            config.model.clone(),
            config.threads,
            config.subsample,
        ));
        let manifest_port = Arc::new(HttpManifestAdapter::new()?);
        let distribution_port = Arc::new(JsonDistributionAdapter::new());

        let materializer = Arc::new(MaterializeInteractor::new(
            Arc::clone(&ffmpeg) as Arc<dyn RemuxPort>,
            Arc::clone(&probe_port) as Arc<dyn ProbePort>,
            config.work_dir.clone(),
        ));

        let quality = Arc::new(QualityInteractor::new(
            Arc::clone(&ffmpeg) as Arc<dyn DecodePort>,
            Arc::clone(&score_port) as Arc<dyn ScorePort>,
            QualitySettings {
                min_resolution: config.min_resolution,
                low_score_threshold: config.low_score_threshold,
                logs_dir: config.logs_dir.clone(),
            },
        ));

        let estimate_interactor = Arc::new(EstimateInteractor::new(
            Arc::clone(&probe_port) as Arc<dyn ProbePort>,
            Arc::clone(&manifest_port) as Arc<dyn ManifestPort>,
            Arc::clone(&distribution_port) as Arc<dyn DistributionPort>,
            materializer,
            quality,
            Arc::clone(&config),
        ));

        Ok(Self {
            estimate_interactor,
            config,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn estimate_interactor(&self) -> Arc<EstimateInteractor> {
        Arc::clone(&self.estimate_interactor)
    }

    fn config(&self) -> Arc<AnalyzerConfig> {
        Arc::clone(&self.config)
    }
}
