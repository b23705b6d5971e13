//! Process-backed tool runner

use super::traits::{ToolOutput, ToolRunner, tool_label};
use crate::error::{Error, ToolError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs tools as child processes
///
/// Stdout and stderr are captured in full. When the cancellation token fires
/// the child is killed (on Unix, together with its process group, so helpers
/// spawned by the downloader die too) and reaped before `run` returns, so no
/// process is still writing into files the caller is about to clean up.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliToolRunner;

#[async_trait]
impl ToolRunner for CliToolRunner {
    async fn run(
        &self,
        tool: &Path,
        args: &[OsString],
        cancel: &CancellationToken,
    ) -> crate::Result<ToolOutput> {
        let label = tool_label(tool);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(tool = %label, args = args.len(), "running external tool");

        let mut command = Command::new(tool);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| ToolError::SpawnFailed {
            tool: label.clone(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = async {
                tokio::join!(child.wait(), read_stream(stdout), read_stream(stderr))
            } => Some(result),
        };

        let Some((status, stdout, stderr)) = finished else {
            debug!(tool = %label, "cancellation requested, terminating process");
            terminate(&mut child).await;
            return Err(Error::Cancelled);
        };

        let status = status.map_err(|e| ToolError::SpawnFailed {
            tool: label.clone(),
            reason: e.to_string(),
        })?;
        let output = ToolOutput::from_bytes(&stdout, &stderr);

        if status.success() {
            debug!(tool = %label, "external tool finished");
            return Ok(output);
        }

        // a kill that raced with normal exit still counts as cancellation
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(tool = %label, code = ?status.code(), "external tool failed");
        Err(ToolError::Failed {
            tool: label,
            exit_code: status.code(),
            log: output.combined(),
        }
        .into())
    }

    fn name(&self) -> &'static str {
        "cli"
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream
        && let Err(e) = stream.read_to_end(&mut buf).await
    {
        debug!(error = %e, "failed to read tool output stream");
    }
    buf
}

/// Kill the child and wait for it to exit
async fn terminate(child: &mut Child) {
    kill_tree(child);
    if let Err(e) = child.wait().await {
        warn!(error = %e, "failed to reap cancelled process");
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id()
        && let Ok(pgid) = libc::pid_t::try_from(pid)
    {
        // SAFETY: kill(2) has no memory-safety preconditions; the negative pid
        // addresses the process group created for this child at spawn.
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc == 0 {
            return;
        }
    }
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "process already exited");
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "process already exited");
    }
}
