//! Bounded, shell-free execution of the external tool.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::FetchError;
use super::types::{InvocationPlan, ProcessOutput};

/// Characters of diagnostic text carried into a `ToolError` message.
const MAX_ERROR_MESSAGE_CHARS: usize = 1000;

/// Runs invocation plans.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Returns the name of this executor implementation.
    fn name(&self) -> &str;

    /// Runs the plan to completion.
    ///
    /// Returns the captured output on a zero exit. Non-zero exits map to
    /// `ToolError`, expiry of the plan's timeout to `Timeout` and start-up
    /// failures to `SpawnError`.
    async fn run(&self, plan: &InvocationPlan) -> Result<ProcessOutput, FetchError>;
}

/// Executor backed by `tokio::process`.
#[derive(Debug, Default, Clone)]
pub struct TokioProcessExecutor;

impl TokioProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

/// Reads a stream to the end, keeping at most `limit` bytes.
///
/// Bytes past the limit are drained and dropped so the child never blocks
/// on a full pipe.
async fn read_bounded<R: AsyncRead + Unpin>(
    mut reader: R,
    limit: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let mut kept = Vec::with_capacity(limit.min(8192));
    let mut truncated = false;
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&buf[..n.min(room)]);
    }

    Ok((kept, truncated))
}

/// The child's process group. Dropping it kills every process still in the
/// group, so helpers the tool started (muxers, external downloaders) never
/// outlive the invocation.
struct ProcessGroup {
    #[cfg(unix)]
    pgid: Option<libc::pid_t>,
}

#[cfg(unix)]
impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|id| libc::pid_t::try_from(id).ok()),
        }
    }

    fn kill(&self) {
        if let Some(pgid) = self.pgid {
            // SAFETY: killpg only sends a signal; the group was created for this child
            let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
            if rc != 0 {
                let e = std::io::Error::last_os_error();
                if e.raw_os_error() != Some(libc::ESRCH) {
                    debug!(pgid, error = %e, "Failed to signal process group");
                }
            }
        }
    }
}

#[cfg(not(unix))]
impl ProcessGroup {
    fn of(_child: &Child) -> Self {
        Self {}
    }

    fn kill(&self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

fn spawn_error(program: &Path, e: std::io::Error) -> FetchError {
    let reason = match e.kind() {
        std::io::ErrorKind::NotFound => "executable not found".to_string(),
        std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => e.to_string(),
    };
    FetchError::SpawnError {
        program: program.to_path_buf(),
        reason,
    }
}

/// Picks the most useful diagnostic text from a failed run.
fn diagnostic_message(stderr: &str, stdout: &str, exit_code: Option<i32>) -> String {
    let source = if !stderr.trim().is_empty() {
        stderr
    } else {
        stdout
    };

    let error_lines: Vec<&str> = source
        .lines()
        .filter(|l| l.contains("ERROR"))
        .collect();
    let text = if error_lines.is_empty() {
        source.trim().to_string()
    } else {
        error_lines.join("\n")
    };

    if text.is_empty() {
        return format!("exited with code {:?}", exit_code);
    }

    // Keep the tail; the last lines carry the actual failure
    let count = text.chars().count();
    if count > MAX_ERROR_MESSAGE_CHARS {
        text.chars().skip(count - MAX_ERROR_MESSAGE_CHARS).collect()
    } else {
        text
    }
}

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    fn name(&self) -> &str {
        "tokio-process"
    }

    async fn run(&self, plan: &InvocationPlan) -> Result<ProcessOutput, FetchError> {
        let start = Instant::now();
        debug!(program = ?plan.program, args = ?plan.args, "Spawning downloader");

        let mut command = Command::new(&plan.program);
        command
            .args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&plan.program, e))?;
        let group = ProcessGroup::of(&child);

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => (out, err),
            _ => {
                let _ = child.kill().await;
                return Err(FetchError::SpawnError {
                    program: plan.program.clone(),
                    reason: "output pipes were not captured".to_string(),
                });
            }
        };

        let limit = plan.max_output_bytes;
        let result = timeout(plan.timeout, async {
            let (status, out, err) = tokio::join!(
                child.wait(),
                read_bounded(stdout, limit),
                read_bounded(stderr, limit)
            );
            Ok::<_, std::io::Error>((status?, out?, err?))
        })
        .await;

        let (status, (out, stdout_truncated), (err, stderr_truncated)) = match result {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => return Err(FetchError::Io(e)),
            Err(_) => {
                warn!(
                    program = ?plan.program,
                    timeout_secs = plan.timeout.as_secs(),
                    "Downloader timed out, killing process group"
                );
                group.kill();
                let _ = child.kill().await;
                return Err(FetchError::Timeout {
                    timeout_secs: plan.timeout.as_secs(),
                });
            }
        };

        let output = ProcessOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&out).into_owned(),
            stderr: String::from_utf8_lossy(&err).into_owned(),
            stdout_truncated,
            stderr_truncated,
            elapsed: start.elapsed(),
        };

        if stdout_truncated || stderr_truncated {
            debug!(
                stdout_truncated,
                stderr_truncated, "Downloader output exceeded capture limit"
            );
        }

        if !status.success() {
            return Err(FetchError::ToolError {
                exit_code: output.exit_code,
                message: diagnostic_message(&output.stderr, &output.stdout, output.exit_code),
            });
        }

        Ok(output)
    }
}
