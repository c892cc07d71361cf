//! Command-line argument value parsers

use clap::ValueEnum;
use clap_num::number_range;

/// Upper bound accepted for `--threads`
pub const MAX_THREADS: usize = 1024;

/// Report output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// `Average VMAF: <score>`
    #[default]
    Text,
    /// Full report as JSON
    Json,
    /// Full report as YAML
    Yaml,
}

pub fn parse_subsample(s: &str) -> Result<u32, String> {
    number_range(s, 1, u32::MAX)
}

pub fn parse_threads(s: &str) -> Result<usize, String> {
    number_range(s, 1, MAX_THREADS)
}
