//! Command implementations

use std::iter;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::TomlConfigAdapter;
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::EstimateRequest;
use crate::cli::{Cli, ReportFormat};
use crate::config::AnalyzerConfig;
use crate::domain::model::EstimateReport;

/// Merge defaults, the config file, environment and flags
pub fn resolve_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let file_layer = TomlConfigAdapter::discover(cli.config.as_deref())
        .context("Failed to load configuration file")?;
    let config = AnalyzerConfig::layered(file_layer.into_iter().chain(iter::once(cli.config_layer())))
        .context("Invalid configuration")?;
    Ok(config)
}

/// Execute the estimate command and print the report to stdout
pub async fn estimate(cli: &Cli, config: AnalyzerConfig, token: CancellationToken) -> Result<()> {
    info!("Mezzanine: {}", cli.mezzanine.display());
    info!("Manifest: {}", cli.manifest_url);

    let container = DefaultAppContainer::new(config).context("Failed to initialize analyzer")?;
    let request = EstimateRequest {
        mezzanine: cli.mezzanine.clone(),
        manifest_url: cli.manifest_url.clone(),
    };

    let report = container
        .estimate_interactor()
        .execute(&request, &token)
        .await
        .context("Estimation failed")?;

    println!("{}", render_report(&report, cli.format)?);
    Ok(())
}

/// Render a report in the requested format
pub fn render_report(report: &EstimateReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(format!("Average VMAF: {:.6}", report.average_vmaf)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
        }
        ReportFormat::Yaml => serde_yaml::to_string(report).context("Failed to serialize report to YAML"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::*;
    use chrono::Utc;
    use clap::Parser;

    fn report() -> EstimateReport {
        EstimateReport {
            reference_width: 1920,
            reference_height: 1080,
            reference_frames: 240,
            unplayable_share: 0.0,
            ladder: vec![LadderEntry {
                index: 1,
                bandwidth_bps: 1_500_000,
                uri: "https://cdn.example.com/1500000/index.m3u8".to_string(),
                viewer_share: 1.0,
            }],
            cells: vec![QualityCell {
                rendition_index: 1,
                resolution_bucket: 44,
                target_width: 720,
                target_height: 404,
                score: 45.0,
            }],
            skipped_too_small: 21,
            skipped_zero_share: 23,
            share_basis: ShareBasis::AllViewers,
            skipped_cells: SkippedCells::CountAsZero,
            average_vmaf: 45.0,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            render_report(&report(), ReportFormat::Text).unwrap(),
            "Average VMAF: 45.000000"
        );
    }

    #[test]
    fn test_render_structured() {
        let json = render_report(&report(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["average_vmaf"], 45.0);
        assert_eq!(value["share_basis"], "all_viewers");
        assert_eq!(value["cells"][0]["target_height"], 404);

        let yaml = render_report(&report(), ReportFormat::Yaml).unwrap();
        assert!(yaml.contains("average_vmaf: 45.0"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("ladder.toml");
        std::fs::write(&path, "[analyzer]\nsubsample = 5\nthreads = 2\n").unwrap();

        let cli = Cli::try_parse_from([
            "ladder-vmaf",
            "--config",
            path.to_str().unwrap(),
            "--threads",
            "6",
            "--share-basis",
            "playable",
            "mezzanine.mp4",
            "https://cdn.example.com/master.m3u8",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.subsample, 5);
        assert_eq!(config.threads, 6);
        assert_eq!(config.share_basis, ShareBasis::PlayableViewers);
    }

    #[test]
    fn test_cli_requires_both_positionals() {
        assert!(Cli::try_parse_from(["ladder-vmaf", "mezzanine.mp4"]).is_err());
        assert!(Cli::try_parse_from(["ladder-vmaf", "--skipped-cells", "sometimes", "a.mp4", "u"]).is_err());
    }
}
