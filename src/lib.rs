//! # media-dl
//!
//! Job engine for fetching online video with an external downloader
//! (`yt-dlp`) and optionally transcoding it with an external transcoder
//! (`ffmpeg`).
//!
//! ## Design Philosophy
//!
//! media-dl is designed to be:
//! - **Single-flight** - One job at a time; a second start is rejected, never queued
//! - **Cancellable** - Cancelling kills the running tool and removes partial files
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events or poll a cheap status snapshot
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, JobController, JobRequest, Profile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = JobController::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = controller.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = JobRequest::convert("https://example.com/watch?v=abc", Profile::P720, "./out")
//!         .with_trim("00:00:10", "00:00:20");
//!     match controller.start(request).await {
//!         Ok(path) => println!("saved to {}", path.display()),
//!         Err(e) if e.is_cancelled() => println!("cancelled"),
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Artifact discovery and cleanup
pub mod artifacts;
/// Configuration types
pub mod config;
/// Single-flight job controller
pub mod controller;
/// Error types
pub mod error;
/// Output naming
pub mod naming;
mod pipeline;
/// Transcode profiles
pub mod presets;
mod status;
/// External tool execution
pub mod tools;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, JobConfig, ToolsConfig};
pub use controller::{CANCELLED_BY_USER, JobController};
pub use error::{Error, Result, ToHttpStatus, ToolError};
pub use presets::Profile;
pub use tools::{CliToolRunner, ToolOutput, ToolRunner};
pub use types::{Action, Event, JobRequest, JobStatus, Stage, Timecode, TrimWindow};

/// Cancel the running job when the process is asked to stop.
///
/// Waits for SIGTERM or SIGINT (Ctrl+C on other platforms), cancels the
/// in-flight job if there is one, and returns once its cleanup has finished,
/// so no partial files survive the shutdown.
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, JobController, cancel_on_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = JobController::new(Config::default())?;
///
///     // Run with automatic signal handling
///     tokio::spawn(cancel_on_shutdown(controller.clone()));
///
///     Ok(())
/// }
/// ```
pub async fn cancel_on_shutdown(controller: JobController) {
    wait_for_signal().await;
    match controller.cancel().await {
        Ok(()) => tracing::info!("cancelled running job for shutdown"),
        Err(Error::NoActiveJob) => tracing::debug!("no running job at shutdown"),
        Err(e) => tracing::warn!(error = %e, "failed to cancel job at shutdown"),
    }
    controller.wait_idle().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
