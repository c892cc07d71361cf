//! Common utilities and helpers

use std::time::Duration;

pub mod cancel;
pub mod logging;
pub mod path;
pub mod process;

/// Utility functions for ladder-vmaf
pub struct Utils;

impl Utils {
    /// Format an elapsed or remaining time as `[HH:]MM:SS`
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }
}
