//! Job lifecycle control: start, cancel, timeout

use super::{CANCELLED_BY_USER, JobController};
use crate::artifacts;
use crate::error::{Error, Result};
use crate::pipeline::{Completed, Pipeline};
use crate::types::{Event, JobRequest, Stage};
use std::path::PathBuf;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

impl JobController {
    /// Run a job to completion and return the output path
    ///
    /// If a job already holds the slot this returns [`Error::JobInProgress`]
    /// without disturbing it, whether or not the new request is valid.
    /// Otherwise the request is validated before the slot is claimed; an
    /// invalid request never touches the status.
    ///
    /// A cancelled or timed-out job returns [`Error::Cancelled`]; check it with
    /// [`Error::is_cancelled`] rather than reporting it as a failure.
    ///
    /// The job runs on its own task, so dropping this future does not abandon
    /// the job half-way through its cleanup.
    pub async fn start(&self, request: JobRequest) -> Result<PathBuf> {
        let handle = self.spawn(request).await?;
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(Error::Cancelled),
        }
    }

    /// Claim the slot and run the job in the background
    ///
    /// Validation and conflict errors are returned immediately; the handle
    /// resolves to the same result [`start`](Self::start) would return.
    ///
    /// The slot is released even if the job panics; the job then ends Failed
    /// with [`Error::Other`].
    pub async fn spawn(&self, request: JobRequest) -> Result<JoinHandle<Result<PathBuf>>> {
        let token = self.claim(&request).await?;

        let controller = self.clone();
        Ok(tokio::spawn(async move {
            let job = tokio::spawn(controller.clone().run_claimed(request, token));
            let (result, timed_out) = match job.await {
                Ok(finished) => finished,
                Err(e) => (Err(job_aborted(e)), false),
            };
            controller.complete(result, timed_out).await
        }))
    }

    /// Cancel the running job
    ///
    /// Signals every in-flight tool run and marks the job Cancelled at once.
    /// The pipeline still removes its artifacts afterwards; the slot stays
    /// claimed until it has (see [`wait_idle`](Self::wait_idle)).
    ///
    /// Returns [`Error::NoActiveJob`] and changes nothing if no job is running
    /// or it was already cancelled.
    pub async fn cancel(&self) -> Result<()> {
        let mut slot = self.inner.slot.lock().await;
        let Some(token) = slot.cancel.take() else {
            return Err(Error::NoActiveJob);
        };
        token.cancel();
        self.inner
            .board
            .finish(Stage::Cancelled, CANCELLED_BY_USER)
            .await;
        drop(slot);

        info!("job cancellation requested");
        Ok(())
    }

    pub(super) async fn claim(&self, request: &JobRequest) -> Result<CancellationToken> {
        let mut slot = self.inner.slot.lock().await;
        if slot.busy {
            debug!(url = %request.source_url, "rejecting job, slot is taken");
            return Err(Error::JobInProgress);
        }
        request.validate()?;

        let token = CancellationToken::new();
        slot.busy = true;
        slot.cancel = Some(token.clone());
        self.inner.busy.send_replace(true);

        info!(
            action = ?request.action,
            profile = %request.profile,
            url = %request.source_url,
            "job started"
        );
        self.inner.board.emit(Event::Started {
            action: request.action,
            url: request.source_url.clone(),
        });
        // under the slot lock so a racing cancel cannot be overwritten
        self.inner.board.begin().await;

        Ok(token)
    }

    async fn run_claimed(
        self,
        request: JobRequest,
        token: CancellationToken,
    ) -> (Result<Completed>, bool) {
        // every exit path leaves the token cancelled
        let _cancel_on_exit = token.clone().drop_guard();

        let inner = &self.inner;
        let pipeline = Pipeline {
            runner: inner.runner.as_ref(),
            config: &inner.config,
            board: &inner.board,
            cancel: &token,
        };

        let timeout = inner.config.job.timeout;
        let run = pipeline.run(&request);
        tokio::pin!(run);

        let mut timed_out = false;
        let result = tokio::select! {
            result = &mut run => result,
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_secs = timeout.as_secs(), "job timed out, cancelling");
                timed_out = true;
                token.cancel();
                run.await
            }
        };

        (result, timed_out)
    }

    pub(super) async fn complete(
        &self,
        result: Result<Completed>,
        timed_out: bool,
    ) -> Result<PathBuf> {
        let inner = &self.inner;
        let mut slot = inner.slot.lock().await;
        slot.busy = false;
        // a cancel accepted before this point has already taken the token
        let user_cancelled = slot.cancel.take().is_none();

        let result = match result {
            Ok(Completed { path, .. }) if user_cancelled || timed_out => {
                debug!(?path, "job cancelled after its last check, discarding output");
                artifacts::remove_file(&path).await;
                Err(Error::Cancelled)
            }
            Err(e) if user_cancelled && !e.is_cancelled() => {
                debug!(error = %e, "job cancelled while reporting a failure");
                Err(Error::Cancelled)
            }
            other => other,
        };

        let outcome = match result {
            Ok(Completed { path, detail }) => {
                inner.board.finish(Stage::Finished, detail).await;
                info!(?path, detail, "job finished");
                inner.board.emit(Event::Complete { path: path.clone() });
                Ok(path)
            }
            Err(e) if e.is_cancelled() => {
                let reason = if timed_out {
                    format!("timed out after {}s", inner.config.job.timeout.as_secs())
                } else {
                    CANCELLED_BY_USER.to_string()
                };
                inner.board.finish(Stage::Cancelled, &reason).await;
                info!(%reason, "job cancelled");
                inner.board.emit(Event::Cancelled { reason });
                Err(e)
            }
            Err(e) => {
                let detail = e.to_string();
                inner.board.finish(Stage::Failed, &detail).await;
                warn!(error = %e, "job failed");
                inner.board.emit(Event::Failed { error: detail });
                Err(e)
            }
        };

        inner.busy.send_replace(false);
        drop(slot);
        outcome
    }
}

/// Turn a job task that died without returning into a reportable error
fn job_aborted(e: JoinError) -> Error {
    if !e.is_panic() {
        return Error::Cancelled;
    }
    let payload = e.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(%message, "job panicked");
    Error::Other(format!("job panicked: {message}"))
}
