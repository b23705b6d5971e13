//! Stand-in tools: small shell scripts that behave like the downloader and
//! transcoder at their command-line boundary.

use media_dl::{Config, JobController};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Title printed by the stand-in downloader's title query
pub const TITLE: &str = "Integration Clip";

/// Downloader fetch behaviours; `$base` is the output template without `.%(ext)s`
pub mod fetch {
    /// Write `<base>.mp4`
    pub const WRITE_MP4: &str = r#"printf media > "$base.mp4""#;
    /// Write `<base>.webm`
    pub const WRITE_WEBM: &str = r#"printf media > "$base.webm""#;
    /// Write a partial file, then keep running until killed
    pub const HANG: &str = r#"printf partial > "$base.mp4.part"; sleep 30"#;
    /// Fail with a log on both streams
    pub const FAIL: &str = r#"echo "[youtube] abc: Downloading webpage"; echo "ERROR: Video unavailable" >&2; exit 1"#;
}

/// Transcoder behaviours; `$input`, `$out`, and `$trimmed` (yes/no) are set
pub mod transcode {
    /// Write the output
    pub const SUCCEED: &str = r#"printf converted > "$out""#;
    /// Fail only when given a seek range
    pub const FAIL_WITH_TRIM: &str = r#"if [ "$trimmed" = yes ]; then printf partial > "$out"; echo "seek failed" >&2; exit 1; fi; printf converted > "$out""#;
    /// Always fail, logging which attempt it was
    pub const FAIL_ALWAYS: &str = r#"printf partial > "$out"; echo "cannot decode (trimmed=$trimmed)" >&2; exit 1"#;
    /// Write a partial output, then keep running until killed
    pub const HANG: &str = r#"printf partial > "$out"; sleep 30"#;
}

/// A controller wired to stand-in tools inside a temporary directory
pub struct ScriptFixture {
    pub controller: JobController,
    pub dir: TempDir,
}

impl ScriptFixture {
    pub fn destination(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("temp")
    }

    /// Sorted names of the files currently in the destination
    pub fn destination_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.destination())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Build a fixture whose downloader and transcoder run the given behaviours
pub fn create_script_fixture(fetch: &str, transcode: &str) -> ScriptFixture {
    let dir = tempfile::tempdir().unwrap();
    let downloader = write_script(dir.path(), "yt-dlp", &downloader_script(fetch));
    let transcoder = write_script(dir.path(), "ffmpeg", &transcoder_script(transcode));

    let mut config = Config::default();
    config.tools.downloader_path = Some(downloader);
    config.tools.transcoder_path = Some(transcoder);
    config.tools.search_path = false;
    config.job.temp_dir = dir.path().join("temp");
    config.job.timeout = Duration::from_secs(60);

    let controller = JobController::new(config).unwrap();
    ScriptFixture { controller, dir }
}

fn downloader_script(fetch: &str) -> String {
    format!(
        r#"#!/bin/sh
mode=fetch
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --get-title) mode=title ;;
    -o) shift; out="$1" ;;
    --) shift; break ;;
  esac
  shift
done
if [ "$mode" = title ]; then
  echo "{TITLE}"
  echo "WARNING: noisy stderr" >&2
  exit 0
fi
base=${{out%'.%(ext)s'}}
{fetch}
"#
    )
}

fn transcoder_script(transcode: &str) -> String {
    format!(
        r#"#!/bin/sh
trimmed=no
input=""
prev=""
for arg in "$@"; do
  [ "$arg" = "-ss" ] && trimmed=yes
  [ "$prev" = "-i" ] && input="$arg"
  prev="$arg"
  out="$arg"
done
if [ ! -f "$input" ]; then
  echo "missing input: $input" >&2
  exit 1
fi
{transcode}
"#
    )
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
