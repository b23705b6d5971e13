//! Transcode profiles and their parameter sets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named quality/format profile
///
/// Parsing is total: any name that is not recognized resolves to
/// [`Profile::Generic`], so a new name coming from a client never
/// falls outside the catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Profile {
    /// Stream copy; routed to the Download pipeline
    Original,
    /// 1280 px wide H.264, small enough for messaging apps
    WhatsApp,
    /// 480 px high H.264
    P480,
    /// 720 px high H.264
    P720,
    /// 1080 px high H.264
    P1080,
    /// 2160 px high H.264 (`4k`, `2160p`, `uhd`)
    Uhd,
    /// Audio only, MP3
    Mp3,
    /// Fallback for unrecognized names
    #[default]
    Generic,
}

const FASTSTART: [&str; 2] = ["-movflags", "+faststart"];

impl Profile {
    /// Resolve a profile name (case-insensitive)
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "original" => Profile::Original,
            "whatsapp" => Profile::WhatsApp,
            "480p" => Profile::P480,
            "720p" => Profile::P720,
            "1080p" => Profile::P1080,
            "4k" | "2160p" | "uhd" => Profile::Uhd,
            "mp3" => Profile::Mp3,
            _ => Profile::Generic,
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Original => "original",
            Profile::WhatsApp => "whatsapp",
            Profile::P480 => "480p",
            Profile::P720 => "720p",
            Profile::P1080 => "1080p",
            Profile::Uhd => "4k",
            Profile::Mp3 => "mp3",
            Profile::Generic => "generic",
        }
    }

    /// Whether the output drops the video stream
    pub fn is_audio_only(&self) -> bool {
        matches!(self, Profile::Mp3)
    }

    /// Output file extension, with the leading dot
    pub fn extension(&self) -> &'static str {
        if self.is_audio_only() { ".mp3" } else { ".mp4" }
    }

    /// Transcoder codec/filter arguments for this profile, in order
    pub fn transcode_args(&self) -> Vec<&'static str> {
        let mut args: Vec<&'static str> = match self {
            Profile::Original => vec!["-c", "copy"],
            Profile::WhatsApp => video_args("scale=1280:-2", "veryfast", "28", "128k"),
            Profile::P480 => video_args("scale=-2:480", "veryfast", "27", "128k"),
            Profile::P720 => video_args("scale=-2:720", "fast", "23", "160k"),
            Profile::P1080 => video_args("scale=-2:1080", "fast", "20", "192k"),
            Profile::Uhd => video_args("scale=-2:2160", "slow", "18", "192k"),
            Profile::Mp3 => return vec!["-vn", "-c:a", "libmp3lame", "-b:a", "160k"],
            Profile::Generic => vec![
                "-c:v", "libx264", "-pix_fmt", "yuv420p", "-preset", "veryfast", "-crf", "23",
                "-c:a", "aac", "-b:a", "160k",
            ],
        };
        args.extend(FASTSTART);
        args
    }
}

fn video_args(
    scale: &'static str,
    preset: &'static str,
    crf: &'static str,
    audio_bitrate: &'static str,
) -> Vec<&'static str> {
    vec![
        "-vf", scale, "-c:v", "libx264", "-pix_fmt", "yuv420p", "-preset", preset, "-crf", crf,
        "-c:a", "aac", "-b:a", audio_bitrate,
    ]
}

impl From<String> for Profile {
    fn from(name: String) -> Self {
        Profile::parse(&name)
    }
}

impl From<&str> for Profile {
    fn from(name: &str) -> Self {
        Profile::parse(name)
    }
}

impl From<Profile> for String {
    fn from(profile: Profile) -> Self {
        profile.as_str().to_string()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
