// Adapters - External system implementations

pub mod distribution_json;
pub mod exec_ffmpeg;
pub mod manifest_http;
pub mod probe_ffprobe;
pub mod score_vmaf;
pub mod toml_config;

// Re-export adapters
pub use distribution_json::JsonDistributionAdapter;
pub use exec_ffmpeg::FFmpegAdapter;
pub use manifest_http::HttpManifestAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use score_vmaf::VmafossexecAdapter;
pub use toml_config::TomlConfigAdapter;
