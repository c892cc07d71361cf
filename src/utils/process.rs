//! External tool invocation
//!
//! Every probe, remux, decode and score step is a child process. Children are
//! spawned with `kill_on_drop` so dropping the future (on cancellation) also
//! stops the process.

use std::ffi::OsString;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Keep only the last N bytes of stderr in error messages.
const MAX_STDERR_BYTES: usize = 16 * 1024;

/// Captured output of a successful tool run
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Failure to run an external tool
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary could not be started at all
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The binary ran and exited unsuccessfully
    #[error("{program} exited with {}{}", exit_code(.code), stderr_suffix(.stderr))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Run `program` with `args`, returning captured output on a zero exit status
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    debug!(program, args = ?args, "Spawning external tool");

    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stderr = stderr_tail(&output.stderr);
    if !output.status.success() {
        return Err(ToolError::Exit {
            program: program.to_string(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(ToolOutput {
        stdout: output.stdout,
        stderr,
    })
}

/// Lossy, trimmed tail of a tool's diagnostic stream
pub fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(MAX_STDERR_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
