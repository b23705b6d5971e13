//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// External tool locations
///
/// Each tool is resolved in order: explicit path, directory of the running
/// executable, current working directory, then `PATH` (if `search_path`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the downloader executable (auto-detected if None)
    #[serde(default)]
    pub downloader_path: Option<PathBuf>,

    /// Path to the transcoder executable (auto-detected if None)
    #[serde(default)]
    pub transcoder_path: Option<PathBuf>,

    /// Downloader binary name used for auto-detection (default: "yt-dlp")
    #[serde(default = "default_downloader_name")]
    pub downloader_name: String,

    /// Transcoder binary name used for auto-detection (default: "ffmpeg")
    #[serde(default = "default_transcoder_name")]
    pub transcoder_name: String,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader_path: None,
            transcoder_path: None,
            downloader_name: default_downloader_name(),
            transcoder_name: default_transcoder_name(),
            search_path: true,
        }
    }
}

/// Job execution settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// Scratch directory for Convert jobs; wiped at the start of every Convert (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Upper bound for a whole job, in seconds when serialized (default: 30 minutes)
    #[serde(default = "default_job_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Downloader format selection used by Download jobs
    #[serde(default = "default_format_selector")]
    pub format_selector: String,

    /// Container the downloader merges separate streams into (default: "mp4")
    #[serde(default = "default_merge_output_format")]
    pub merge_output_format: String,

    /// Capacity of the event broadcast channel (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            timeout: default_job_timeout(),
            format_selector: default_format_selector(),
            merge_output_format: default_merge_output_format(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Main configuration for media-dl
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Job execution settings
    #[serde(default)]
    pub job: JobConfig,
}

impl Config {
    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.job.timeout.is_zero() {
            return Err(config_error("job timeout must be greater than zero", "timeout"));
        }
        if self.tools.downloader_name.trim().is_empty() {
            return Err(config_error(
                "downloader name must not be empty",
                "downloader_name",
            ));
        }
        if self.tools.transcoder_name.trim().is_empty() {
            return Err(config_error(
                "transcoder name must not be empty",
                "transcoder_name",
            ));
        }
        if self.job.format_selector.trim().is_empty() {
            return Err(config_error(
                "format selector must not be empty",
                "format_selector",
            ));
        }
        if self.job.event_capacity == 0 {
            return Err(config_error(
                "event capacity must be greater than zero",
                "event_capacity",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_downloader_name() -> String {
    "yt-dlp".to_string()
}

fn default_transcoder_name() -> String {
    "ffmpeg".to_string()
}

fn default_true() -> bool {
    true
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_job_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_format_selector() -> String {
    "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b".to_string()
}

fn default_merge_output_format() -> String {
    "mp4".to_string()
}

fn default_event_capacity() -> usize {
    64
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
