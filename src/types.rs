//! Core types for media-dl

use crate::error::{Error, Result};
use crate::presets::Profile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What a job should do with the fetched resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Fetch and merge streams without re-encoding
    Download,
    /// Fetch, then transcode with a profile (optionally trimmed)
    Convert,
}

/// Phase of the single in-flight job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// No job has run yet, or a job is being set up
    #[default]
    Idle,
    /// The downloader is fetching the source
    Downloading,
    /// The transcoder is processing the downloaded file
    Converting,
    /// The last job produced its output
    Finished,
    /// The last job failed; `detail` holds the diagnostic
    Failed,
    /// The last job was cancelled or timed out
    Cancelled,
}

impl Stage {
    /// Whether a job in this stage has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Finished | Stage::Failed | Stage::Cancelled)
    }
}

/// Snapshot of the process-wide job status
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Whether a job is currently running
    pub running: bool,
    /// Current stage
    pub stage: Stage,
    /// Free-text diagnostic for the current stage
    pub detail: String,
}

/// A `HH:MM:SS` timecode
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode(u32);

impl Timecode {
    /// Parse a strict two-digit `HH:MM:SS` timecode (minutes and seconds below 60)
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
            return None;
        }
        let field = |i: usize| -> Option<u32> {
            let (hi, lo) = (bytes[i], bytes[i + 1]);
            if hi.is_ascii_digit() && lo.is_ascii_digit() {
                Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
            } else {
                None
            }
        };
        let (hours, minutes, seconds) = (field(0)?, field(3)?, field(6)?);
        if minutes > 59 || seconds > 59 {
            return None;
        }
        Some(Self(hours * 3600 + minutes * 60 + seconds))
    }

    /// Offset from the start of the media, in seconds
    pub fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 / 60) % 60,
            self.0 % 60
        )
    }
}

/// A validated start/end range with `start < end`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrimWindow {
    /// Inclusive start of the range
    pub start: Timecode,
    /// End of the range
    pub end: Timecode,
}

/// An immutable request to run one job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Download or Convert
    pub action: Action,
    /// Remote resource to fetch
    #[serde(rename = "url")]
    pub source_url: String,
    /// Transcode profile (ignored by Download)
    #[serde(default)]
    pub profile: Profile,
    /// Optional trim start (`HH:MM:SS`); empty means unset
    #[serde(default, rename = "start", skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<String>,
    /// Optional trim end (`HH:MM:SS`); empty means unset
    #[serde(default, rename = "end", skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<String>,
    /// Directory the final output goes into (required)
    #[serde(rename = "outputDir")]
    pub destination_dir: PathBuf,
}

impl JobRequest {
    /// Request a plain download into `destination_dir`
    pub fn download(url: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            action: Action::Download,
            source_url: url.into(),
            profile: Profile::Original,
            trim_start: None,
            trim_end: None,
            destination_dir: destination_dir.into(),
        }
    }

    /// Request a conversion with `profile` into `destination_dir`
    pub fn convert(
        url: impl Into<String>,
        profile: Profile,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            action: Action::Convert,
            source_url: url.into(),
            profile,
            trim_start: None,
            trim_end: None,
            destination_dir: destination_dir.into(),
        }
    }

    /// Restrict the output to `start..end`
    pub fn with_trim(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.trim_start = Some(start.into());
        self.trim_end = Some(end.into());
        self
    }

    /// Whether this request runs the Download pipeline
    ///
    /// `original` never re-encodes, so it is routed to Download regardless of action.
    pub fn is_plain_download(&self) -> bool {
        self.action == Action::Download || self.profile == Profile::Original
    }

    /// Validate the trim pair and return the parsed window, if any
    pub fn trim_window(&self) -> Result<Option<TrimWindow>> {
        let start = non_empty(self.trim_start.as_deref());
        let end = non_empty(self.trim_end.as_deref());

        let (start, end) = match (start, end) {
            (None, None) => return Ok(None),
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(Error::validation(
                    "trim",
                    "set both trim start and end, or leave both empty",
                ));
            }
        };

        let (Some(start), Some(end)) = (Timecode::parse(start), Timecode::parse(end)) else {
            return Err(Error::validation("trim", "times must use the HH:MM:SS format"));
        };

        if start >= end {
            return Err(Error::validation(
                "trim",
                "trim start must be before trim end",
            ));
        }

        Ok(Some(TrimWindow { start, end }))
    }

    /// Reject malformed requests before any state is touched
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(Error::validation("url", "source URL is required"));
        }
        if self.destination_dir.as_os_str().is_empty()
            || self.destination_dir.to_string_lossy().trim().is_empty()
        {
            return Err(Error::validation(
                "outputDir",
                "destination directory is required",
            ));
        }
        self.trim_window()?;
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Event emitted during a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A job claimed the slot and is starting
    Started {
        /// Requested action
        action: Action,
        /// Source URL
        url: String,
    },

    /// The job moved to another stage
    StageChanged {
        /// New stage
        stage: Stage,
        /// Stage detail
        detail: String,
    },

    /// The trimmed transcode failed and the untrimmed retry is starting
    TrimDropped,

    /// The job produced its output
    Complete {
        /// Final output file
        path: PathBuf,
    },

    /// The job failed
    Failed {
        /// Error message
        error: String,
    },

    /// The job was cancelled or timed out
    Cancelled {
        /// Short human-readable reason
        reason: String,
    },
}
