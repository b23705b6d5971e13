//! Shared test helpers: a scripted tool runner and a controller wired to it.

use super::JobController;
use crate::config::Config;
use crate::error::{Error, ToolError};
use crate::tools::{ToolOutput, ToolRunner};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// How the scripted downloader behaves when fetching
#[derive(Clone, Debug)]
pub(crate) enum Fetch {
    /// Write `<template>` with this extension and succeed
    Write(&'static str),
    /// Exit non-zero with this log
    Fail(&'static str),
    /// Succeed without writing anything
    Nothing,
    /// Write a `.part` file, then run until cancelled
    Hang,
    /// Panic inside the runner
    Panic,
}

/// How the scripted transcoder behaves
#[derive(Clone, Debug)]
pub(crate) enum Transcode {
    /// Write the output file and succeed
    Succeed,
    /// Fail (after writing a partial output) only when given a seek range
    FailWithTrim,
    /// Always fail after writing a partial output
    FailAlways,
    /// Write a partial output, then run until cancelled
    Hang,
}

/// Which tool an invocation was for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Title,
    Fetch,
    Transcode { trimmed: bool },
}

/// A [`ToolRunner`] that imitates the downloader and transcoder by writing files
pub(crate) struct ScriptedRunner {
    pub title: Option<&'static str>,
    pub fetch: Fetch,
    pub transcode: Transcode,
    pub calls: Mutex<Vec<Call>>,
    /// Signalled when a hanging invocation has started
    pub hanging: Notify,
}

impl ScriptedRunner {
    pub(crate) fn new(fetch: Fetch, transcode: Transcode) -> Self {
        Self {
            title: Some("Test Clip"),
            fetch,
            transcode,
            calls: Mutex::new(Vec::new()),
            hanging: Notify::new(),
        }
    }

    pub(crate) fn with_title(mut self, title: Option<&'static str>) -> Self {
        self.title = title;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn transcode_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Transcode { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn hang(&self, cancel: &CancellationToken) -> crate::Result<ToolOutput> {
        self.hanging.notify_one();
        cancel.cancelled().await;
        Err(Error::Cancelled)
    }
}

fn failed(tool: &str, log: &str) -> Error {
    ToolError::Failed {
        tool: tool.to_string(),
        exit_code: Some(1),
        log: log.to_string(),
    }
    .into()
}

/// Resolve a downloader `-o` template to a concrete path
fn expand_template(template: &OsString, ext: &str) -> PathBuf {
    PathBuf::from(
        template
            .to_string_lossy()
            .replace("%(ext)s", ext)
            .replace("%%", "%"),
    )
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(
        &self,
        _tool: &Path,
        args: &[OsString],
        cancel: &CancellationToken,
    ) -> crate::Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if args.iter().any(|a| a == "--get-title") {
            self.record(Call::Title);
            return match self.title {
                Some(title) => Ok(ToolOutput {
                    stdout: format!("{title}\n"),
                    stderr: String::new(),
                }),
                None => Err(failed("yt-dlp", "ERROR: unable to extract title")),
            };
        }

        if args.first().is_some_and(|a| a == "-o") {
            self.record(Call::Fetch);
            let template = &args[1];
            return match &self.fetch {
                Fetch::Write(ext) => {
                    std::fs::write(expand_template(template, ext), b"media").unwrap();
                    Ok(ToolOutput::default())
                }
                Fetch::Fail(log) => Err(failed("yt-dlp", log)),
                Fetch::Nothing => Ok(ToolOutput::default()),
                Fetch::Hang => {
                    std::fs::write(expand_template(template, "mp4.part"), b"partial").unwrap();
                    self.hang(cancel).await
                }
                Fetch::Panic => panic!("scripted downloader crashed"),
            };
        }

        let trimmed = args.iter().any(|a| a == "-ss");
        self.record(Call::Transcode { trimmed });
        let output = PathBuf::from(args.last().unwrap());
        match self.transcode {
            Transcode::Succeed => {
                std::fs::write(&output, b"converted").unwrap();
                Ok(ToolOutput::default())
            }
            Transcode::FailWithTrim if !trimmed => {
                std::fs::write(&output, b"converted").unwrap();
                Ok(ToolOutput::default())
            }
            Transcode::FailWithTrim => {
                std::fs::write(&output, b"partial").unwrap();
                Err(failed("ffmpeg", "seek point misaligned"))
            }
            Transcode::FailAlways => {
                std::fs::write(&output, b"partial").unwrap();
                let log = if trimmed {
                    "trimmed: invalid data"
                } else {
                    "untrimmed: invalid data"
                };
                Err(failed("ffmpeg", log))
            }
            Transcode::Hang => {
                std::fs::write(&output, b"partial").unwrap();
                self.hang(cancel).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Test fixture: a controller whose tools, scratch directory, and
/// destination all live in one temporary directory
pub(crate) struct Fixture {
    pub controller: JobController,
    pub runner: Arc<ScriptedRunner>,
    pub dir: TempDir,
}

impl Fixture {
    pub(crate) fn destination(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub(crate) fn work_dir(&self) -> PathBuf {
        self.dir.path().join("temp")
    }

    /// Names of the files currently in the destination
    pub(crate) fn destination_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.destination())
            .map(|entries| {
                entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub(crate) fn test_config(dir: &Path) -> Config {
    let downloader = dir.join("yt-dlp");
    let transcoder = dir.join("ffmpeg");
    std::fs::write(&downloader, b"").unwrap();
    std::fs::write(&transcoder, b"").unwrap();

    let mut config = Config::default();
    config.tools.downloader_path = Some(downloader);
    config.tools.transcoder_path = Some(transcoder);
    config.tools.search_path = false;
    config.job.temp_dir = dir.join("temp");
    config.job.timeout = Duration::from_secs(60);
    config
}

pub(crate) fn create_fixture(runner: ScriptedRunner) -> Fixture {
    create_fixture_with(runner, |_| {})
}

pub(crate) fn create_fixture_with(
    runner: ScriptedRunner,
    adjust: impl FnOnce(&mut Config),
) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    adjust(&mut config);

    let runner = Arc::new(runner);
    let controller = JobController::with_runner(config, runner.clone()).unwrap();
    Fixture {
        controller,
        runner,
        dir,
    }
}
