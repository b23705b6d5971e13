//! Shared job status and event fan-out

use crate::types::{Event, JobStatus, Stage};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

/// The process-wide [`JobStatus`] plus the event channel
///
/// Holds its lock only for the duration of a field update, never across a
/// tool run, so status reads do not wait on pipeline work.
pub(crate) struct StatusBoard {
    status: Mutex<JobStatus>,
    events: broadcast::Sender<Event>,
}

impl StatusBoard {
    pub(crate) fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            status: Mutex::new(JobStatus::default()),
            events,
        }
    }

    pub(crate) async fn snapshot(&self) -> JobStatus {
        self.status.lock().await.clone()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Emit an event; a missing subscriber is not an error
    pub(crate) fn emit(&self, event: Event) {
        self.events.send(event).ok();
    }

    /// Mark a freshly claimed job as running
    pub(crate) async fn begin(&self) {
        self.replace(true, Stage::Idle, "starting").await;
    }

    /// Move the running job to `stage`
    ///
    /// Ignored once the job is no longer running, so a pipeline racing a
    /// cancel cannot overwrite the Cancelled stage.
    pub(crate) async fn advance(&self, stage: Stage, detail: &str) {
        let mut status = self.status.lock().await;
        if !status.running {
            debug!(?stage, "job no longer running, stage update dropped");
            return;
        }
        status.stage = stage;
        status.detail = detail.to_string();
        drop(status);

        debug!(?stage, detail, "stage changed");
        self.emit(Event::StageChanged {
            stage,
            detail: detail.to_string(),
        });
    }

    /// Set a terminal stage and clear `running`
    pub(crate) async fn finish(&self, stage: Stage, detail: &str) {
        self.replace(false, stage, detail).await;
    }

    async fn replace(&self, running: bool, stage: Stage, detail: &str) {
        *self.status.lock().await = JobStatus {
            running,
            stage,
            detail: detail.to_string(),
        };
        debug!(?stage, running, detail, "stage changed");
        self.emit(Event::StageChanged {
            stage,
            detail: detail.to_string(),
        });
    }
}
