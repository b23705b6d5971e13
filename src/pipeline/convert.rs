use super::args::{self, RAW_STEM};
use super::{Completed, Pipeline};
use crate::artifacts;
use crate::error::{Error, Result, ToolError};
use crate::naming;
use crate::presets::Profile;
use crate::tools::{find_downloader, find_transcoder, tool_label};
use crate::types::{Event, JobRequest, Stage, TrimWindow};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const ATTEMPT_WITH_TRIM: &str = "--- attempt 1 (with trim) ---";
const ATTEMPT_WITHOUT_TRIM: &str = "--- attempt 2 (without trim) ---";

/// Paths of one Convert run
struct ConvertPlan<'a> {
    downloader: PathBuf,
    transcoder: PathBuf,
    work_dir: &'a Path,
    output: PathBuf,
    profile: Profile,
    trim: Option<TrimWindow>,
}

impl Pipeline<'_> {
    /// Fetch into the scratch directory, then transcode into the destination
    ///
    /// The scratch directory is recreated empty at the start and removed on
    /// every exit. On failure or cancellation the partial output is removed too.
    pub(super) async fn convert(&self, request: &JobRequest) -> Result<Completed> {
        // rejected before any tool runs
        let trim = request.trim_window()?;

        self.board
            .advance(Stage::Downloading, "preparing conversion")
            .await;

        let downloader = find_downloader(&self.config.tools)?;
        let transcoder = find_transcoder(&self.config.tools)?;

        let destination = &request.destination_dir;
        fs::create_dir_all(destination).await?;

        let base = naming::resolve_base_name(
            self.runner,
            &downloader,
            &request.source_url,
            self.cancel,
        )
        .await?;

        let plan = ConvertPlan {
            downloader,
            transcoder,
            work_dir: &self.config.job.temp_dir,
            output: destination.join(format!("{base}{}", request.profile.extension())),
            profile: request.profile,
            trim,
        };
        debug!(output = ?plan.output, profile = %plan.profile, trimmed = trim.is_some(), "planned conversion");

        artifacts::reset_dir(plan.work_dir).await?;

        let result = self.fetch_and_transcode(&plan, &request.source_url).await;
        match &result {
            Ok(_) => {
                artifacts::remove_dir(plan.work_dir).await;
            }
            Err(e) => {
                artifacts::discard_convert(plan.work_dir, &plan.output).await;
                if e.is_cancelled() {
                    info!("conversion cancelled, temporary files removed");
                }
            }
        }
        result
    }

    async fn fetch_and_transcode(&self, plan: &ConvertPlan<'_>, url: &str) -> Result<Completed> {
        self.board
            .advance(Stage::Downloading, "downloading source")
            .await;
        self.run_tool(&plan.downloader, &args::fetch_raw(plan.work_dir, url))
            .await?;

        let input = match artifacts::find_by_prefix(plan.work_dir, RAW_STEM)
            .await
            .into_result()
        {
            Ok(input) => input,
            Err(_) if self.cancel.is_cancelled() => return Err(Error::Cancelled),
            Err(e) => return Err(e),
        };

        self.board
            .advance(Stage::Converting, "converting")
            .await;

        let first = self
            .run_tool(
                &plan.transcoder,
                &args::transcode(&input, plan.trim, plan.profile, &plan.output),
            )
            .await;

        let detail = match first {
            Ok(_) => "conversion complete",
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) if plan.trim.is_none() => return Err(e),
            Err(trimmed_failure) => {
                warn!(error = %trimmed_failure, "trimmed conversion failed, retrying without trim");
                self.board.emit(Event::TrimDropped);
                self.board
                    .advance(Stage::Converting, "trim failed, converting full length")
                    .await;

                let retry = self
                    .run_tool(
                        &plan.transcoder,
                        &args::transcode(&input, None, plan.profile, &plan.output),
                    )
                    .await;
                match retry {
                    Ok(_) => "conversion complete (fallback without trim)",
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(untrimmed_failure) => {
                        return Err(both_attempts_failed(
                            &plan.transcoder,
                            &trimmed_failure,
                            &untrimmed_failure,
                        ));
                    }
                }
            }
        };

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        artifacts::remove_file(&input).await;
        Ok(Completed {
            path: plan.output.clone(),
            detail,
        })
    }
}

/// One failure carrying both attempts' logs, labelled
fn both_attempts_failed(transcoder: &Path, trimmed: &Error, untrimmed: &Error) -> Error {
    let exit_code = match untrimmed {
        Error::Tool(ToolError::Failed { exit_code, .. }) => *exit_code,
        _ => None,
    };
    ToolError::Failed {
        tool: tool_label(transcoder),
        exit_code,
        log: format!(
            "{ATTEMPT_WITH_TRIM}\n{}\n{ATTEMPT_WITHOUT_TRIM}\n{}",
            failure_log(trimmed),
            failure_log(untrimmed)
        ),
    }
    .into()
}

fn failure_log(error: &Error) -> String {
    match error {
        Error::Tool(tool_error) => tool_error
            .log()
            .map(str::to_string)
            .unwrap_or_else(|| tool_error.to_string()),
        other => other.to_string(),
    }
}
