//! Error types for media-dl
//!
//! This module provides the error taxonomy of the job engine:
//! - Request errors rejected before any tool runs (validation, conflict)
//! - External tool errors (missing binary, spawn failure, non-zero exit)
//! - Cancellation, which is an expected interruption rather than a failure
//! - HTTP status code mapping for whatever transport sits on top

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "timeout")
        key: Option<String>,
    },

    /// The job request is malformed (bad trim window, missing destination, ...)
    #[error("invalid request: {message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
        /// The request field that failed validation
        field: Option<String>,
    },

    /// A job is already running; only one job may be in flight at a time
    #[error("a job is already running")]
    JobInProgress,

    /// Cancel was requested but no job is running
    #[error("no job is running")]
    NoActiveJob,

    /// External tool error (downloader or transcoder)
    #[error("external tool error: {0}")]
    Tool(#[from] ToolError),

    /// A tool reported success but its output file could not be located
    #[error("output file not found (looked for {pattern})")]
    OutputNotFound {
        /// The path or prefix pattern that was searched
        pattern: String,
    },

    /// The job was cancelled (explicitly or by the job timeout)
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a validation error for a specific request field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Whether this error is the cancellation sentinel
    ///
    /// Cancellation is not a reportable failure: callers should clean up and
    /// report a Cancelled stage instead of surfacing an error message.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// External tool errors
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary could not be found in any of the searched locations
    #[error("{tool} not found (searched: {})", display_paths(.searched))]
    NotFound {
        /// Tool name (e.g., "yt-dlp")
        tool: String,
        /// Every location that was checked
        searched: Vec<PathBuf>,
    },

    /// The binary exists but the process could not be started
    #[error("failed to execute {tool}: {reason}")]
    SpawnFailed {
        /// Tool name or path
        tool: String,
        /// OS error description
        reason: String,
    },

    /// The process ran and exited unsuccessfully
    #[error("{tool} failed ({}):\n{log}", exit_label(.exit_code))]
    Failed {
        /// Tool name or path
        tool: String,
        /// Exit code, if the process exited normally
        exit_code: Option<i32>,
        /// Combined stdout/stderr output
        log: String,
    },
}

impl ToolError {
    /// Captured output of a failed run, if any
    pub fn log(&self) -> Option<&str> {
        match self {
            ToolError::Failed { log, .. } => Some(log),
            _ => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no locations".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Convert errors to HTTP status codes for a transport layer
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation { .. } => 400,
            Error::NoActiveJob => 400,

            // 408 - the job was interrupted before completing
            Error::Cancelled => 408,

            // 409 Conflict - single-flight slot is taken
            Error::JobInProgress => 409,

            // 500 Internal Server Error
            Error::OutputNotFound { .. } => 500,
            Error::Io(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - the external tool itself failed
            Error::Tool(ToolError::Failed { .. }) => 502,

            // 503 Service Unavailable - tooling is missing or cannot start
            Error::Tool(ToolError::NotFound { .. }) => 503,
            Error::Tool(ToolError::SpawnFailed { .. }) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::JobInProgress => "job_in_progress",
            Error::NoActiveJob => "no_active_job",
            Error::Tool(e) => match e {
                ToolError::NotFound { .. } => "tool_not_found",
                ToolError::SpawnFailed { .. } => "tool_spawn_failed",
                ToolError::Failed { .. } => "tool_failed",
            },
            Error::OutputNotFound { .. } => "output_not_found",
            Error::Cancelled => "cancelled",
            Error::Io(_) => "io_error",
            Error::Other(_) => "internal_error",
        }
    }
}
