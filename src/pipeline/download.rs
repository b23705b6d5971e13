use super::{Completed, Pipeline, args};
use crate::artifacts;
use crate::error::{Error, Result};
use crate::naming;
use crate::tools::find_downloader;
use crate::types::{JobRequest, Stage};
use tokio::fs;
use tracing::{debug, info};

impl Pipeline<'_> {
    /// Fetch the resource straight into the destination without re-encoding
    pub(super) async fn download(&self, request: &JobRequest) -> Result<Completed> {
        self.board
            .advance(Stage::Downloading, "preparing download")
            .await;

        let destination = &request.destination_dir;
        fs::create_dir_all(destination).await?;
        let downloader = find_downloader(&self.config.tools)?;

        let base = naming::resolve_base_name(
            self.runner,
            &downloader,
            &request.source_url,
            self.cancel,
        )
        .await?;
        let prefix = destination.join(&base);
        debug!(?prefix, "resolved output prefix");

        self.board
            .advance(Stage::Downloading, "downloading without re-encoding")
            .await;

        let job = &self.config.job;
        let fetch = args::fetch_merged(
            &prefix,
            &job.format_selector,
            &job.merge_output_format,
            &request.source_url,
        );
        if let Err(e) = self.run_tool(&downloader, &fetch).await {
            if e.is_cancelled() {
                let removed = artifacts::remove_prefixed(destination, &base).await;
                info!(removed, "download cancelled, partial files removed");
            }
            return Err(e);
        }

        let output = artifacts::find_output(destination, &base, &job.merge_output_format)
            .await
            .into_result()?;

        // a cancel that landed after the last tool run still wins
        if self.cancel.is_cancelled() {
            artifacts::remove_prefixed(destination, &base).await;
            return Err(Error::Cancelled);
        }

        Ok(Completed {
            path: output,
            detail: "download complete",
        })
    }
}
