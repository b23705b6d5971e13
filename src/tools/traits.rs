//! Traits and types for running external tools

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Captured output of a successful tool run
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Everything the process wrote to stdout (lossy UTF-8)
    pub stdout: String,
    /// Everything the process wrote to stderr (lossy UTF-8)
    pub stderr: String,
}

impl ToolOutput {
    /// Build an output from raw stream bytes
    pub fn from_bytes(stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr).trim().to_string()
    }
}

/// Trait for executing one external tool invocation
///
/// Implementations must distinguish three outcomes:
/// - success: `Ok(ToolOutput)`
/// - cancellation: `Err(Error::Cancelled)` when `cancel` fired before or during the run;
///   the process must be terminated before returning
/// - failure: `Err(Error::Tool(ToolError::Failed { .. }))` carrying the combined log
///
/// # Examples
///
/// ```no_run
/// use media_dl::tools::{CliToolRunner, ToolRunner};
/// use std::ffi::OsString;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cancel = CancellationToken::new();
/// let args = vec![OsString::from("--version")];
/// let output = CliToolRunner.run(Path::new("ffmpeg"), &args, &cancel).await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `tool` with `args` until it exits or `cancel` fires
    async fn run(
        &self,
        tool: &Path,
        args: &[OsString],
        cancel: &CancellationToken,
    ) -> crate::Result<ToolOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Short tool label for logs and errors (file name without directory)
pub(crate) fn tool_label(tool: &Path) -> String {
    tool.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string())
}
