//! Custom test assertions for integration tests

use media_dl::{Event, JobController, Stage};
use std::path::Path;
use std::time::Duration;

/// Wait for a specific event
pub async fn wait_for_event<F>(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    timeout: Duration,
    predicate: F,
) -> Option<Event>
where
    F: Fn(&Event) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    })
    .await;

    result.ok().flatten()
}

/// Poll until `path` exists
pub async fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, async {
        while !path.exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}

/// Assert the controller reports `stage` and is not running
pub async fn assert_terminal(controller: &JobController, stage: Stage) -> String {
    let status = controller.status().await;
    assert!(!status.running, "job still running: {status:?}");
    assert_eq!(status.stage, stage, "detail: {}", status.detail);
    status.detail
}
