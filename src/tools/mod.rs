//! External tool execution
//!
//! The core abstraction is the [`ToolRunner`] trait, which runs one tool
//! invocation bound to a cancellation token and normalizes the outcome into
//! success, cancellation, or failure with the captured log.
//!
//! - [`CliToolRunner`]: spawns real child processes
//! - [`find_downloader`] / [`find_transcoder`]: binary discovery
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::config::ToolsConfig;
//! use media_dl::tools::{CliToolRunner, ToolRunner, find_downloader};
//! use std::ffi::OsString;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let yt_dlp = find_downloader(&ToolsConfig::default())?;
//!     let cancel = CancellationToken::new();
//!     let args = vec![OsString::from("--version")];
//!     let output = CliToolRunner.run(&yt_dlp, &args, &cancel).await?;
//!     println!("yt-dlp {}", output.stdout.trim());
//!     Ok(())
//! }
//! ```

mod cli;
mod locate;
mod traits;

pub use cli::CliToolRunner;
pub use locate::{find_downloader, find_tool, find_transcoder};
pub use traits::{ToolOutput, ToolRunner};
pub(crate) use traits::tool_label;
