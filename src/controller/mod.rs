//! Single-flight job controller
//!
//! [`JobController`] owns the only job slot, the process-wide [`JobStatus`],
//! and the cancellation token of the running job. It exposes the whole
//! surface a transport layer needs:
//! - [`start`](JobController::start) / [`spawn`](JobController::spawn) to run a job
//! - [`cancel`](JobController::cancel) to stop it
//! - [`status`](JobController::status) / [`subscribe`](JobController::subscribe) to observe it

mod control;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_helpers;

use crate::config::Config;
use crate::error::Result;
use crate::status::StatusBoard;
use crate::tools::{CliToolRunner, ToolRunner};
use crate::types::{Event, JobStatus};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Detail recorded when a job is stopped through [`JobController::cancel`]
pub const CANCELLED_BY_USER: &str = "cancelled by user";

/// Runs at most one download/convert job at a time
///
/// Cloning is cheap; clones share the same slot and status.
///
/// # Examples
///
/// ```no_run
/// use media_dl::{Config, JobController, JobRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = JobController::new(Config::default())?;
///
///     let request = JobRequest::download("https://example.com/watch?v=abc", "./downloads");
///     let path = controller.start(request).await?;
///     println!("saved to {}", path.display());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct JobController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: Config,
    runner: Arc<dyn ToolRunner>,
    /// Claimed from Start until the pipeline has returned and cleaned up
    slot: Mutex<JobSlot>,
    board: StatusBoard,
    /// Mirrors `JobSlot::busy` for [`JobController::wait_idle`]
    busy: watch::Sender<bool>,
}

#[derive(Default)]
struct JobSlot {
    busy: bool,
    /// Taken by the first cancel; `None` once cancelled or finished
    cancel: Option<CancellationToken>,
}

impl JobController {
    /// Create a controller that runs the real external tools
    pub fn new(config: Config) -> Result<Self> {
        Self::with_runner(config, Arc::new(CliToolRunner))
    }

    /// Create a controller with a custom [`ToolRunner`]
    pub fn with_runner(config: Config, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        config.validate()?;
        let board = StatusBoard::new(config.job.event_capacity);
        let (busy, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                runner,
                slot: Mutex::new(JobSlot::default()),
                board,
                busy,
            }),
        })
    }

    /// Snapshot of the current job status
    ///
    /// Never waits on the running job's tool invocations.
    pub async fn status(&self) -> JobStatus {
        self.inner.board.snapshot().await
    }

    /// Subscribe to job events
    ///
    /// Slow subscribers may miss events (`RecvError::Lagged`); the status
    /// snapshot stays authoritative.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.board.subscribe()
    }

    /// The configuration this controller was built with
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Wait until no job holds the slot
    ///
    /// Returns once a cancelled job has finished its cleanup.
    pub async fn wait_idle(&self) {
        let mut busy = self.inner.busy.subscribe();
        // the sender lives in `inner`, so the channel cannot close while we wait
        busy.wait_for(|busy| !*busy).await.ok();
    }
}

impl std::fmt::Debug for JobController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobController")
            .field("runner", &self.inner.runner.name())
            .field("busy", &*self.inner.busy.borrow())
            .finish_non_exhaustive()
    }
}
