//! Download and Convert job pipelines
//!
//! Each pipeline is a sequence of stage transitions driving tool runs. A
//! pipeline observes cancellation only through the token handed to every tool
//! run, and cleans up its own artifacts on every abnormal exit before
//! returning:
//!
//! - Download: fetch straight into the destination, merged to one container
//! - Convert: fetch into a scratch directory, then transcode with a profile,
//!   retrying once without the trim window if the trimmed transcode fails

pub(crate) mod args;
mod convert;
mod download;

use crate::config::Config;
use crate::error::Result;
use crate::status::StatusBoard;
use crate::tools::{ToolOutput, ToolRunner, tool_label};
use crate::types::JobRequest;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Successful end of a pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Completed {
    /// Final output file
    pub path: PathBuf,
    /// Detail recorded with the Finished stage
    pub detail: &'static str,
}

/// Everything one pipeline run borrows from its controller
pub(crate) struct Pipeline<'a> {
    pub runner: &'a dyn ToolRunner,
    pub config: &'a Config,
    pub board: &'a StatusBoard,
    pub cancel: &'a CancellationToken,
}

impl Pipeline<'_> {
    /// Run the pipeline selected by the request
    ///
    /// `original` is routed to Download whatever the requested action.
    pub(crate) async fn run(&self, request: &JobRequest) -> Result<Completed> {
        if request.is_plain_download() {
            self.download(request).await
        } else {
            self.convert(request).await
        }
    }

    async fn run_tool(&self, tool: &Path, args: &[OsString]) -> Result<ToolOutput> {
        debug!(
            tool = %tool_label(tool),
            runner = self.runner.name(),
            args = args.len(),
            "invoking tool"
        );
        self.runner.run(tool, args, self.cancel).await
    }
}
