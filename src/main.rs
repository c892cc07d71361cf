//! ladder-vmaf
//!
//! Average viewer VMAF of an HLS encoding ladder.
//!
//! # Usage
//!
//! ```bash
//! ladder-vmaf --subsample 30 --threads 8 --model model/vmaf_v0.6.1.pkl \
//!     --datafile data.json mezzanine.mp4 https://example.com/hls_stream.m3u8
//! ```

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ladder_vmaf::cli::{commands, Cli};
use ladder_vmaf::utils::logging::{LogFormat, LoggingConfig, LoggingSystem};

/// Main entry point for ladder-vmaf
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();
    let config = commands::resolve_config(&cli)?;

    // Initialize logging
    let logging = LoggingSystem::new(LoggingConfig {
        level: config.log_level,
        format: if config.log_json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
    });
    logging.initialize()?;
    logging.log_system_info();

    // Ctrl-C aborts the cell in flight and kills its tools
    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            interrupt.cancel();
        }
    });

    if let Err(e) = commands::estimate(&cli, config, token).await {
        error!("{:#}", e);
        return Err(e);
    }

    info!("ladder-vmaf completed successfully");
    Ok(())
}
