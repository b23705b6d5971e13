//! Binary discovery for the downloader and transcoder

use crate::config::ToolsConfig;
use crate::error::{Result, ToolError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locate the downloader binary according to `config`
pub fn find_downloader(config: &ToolsConfig) -> Result<PathBuf> {
    find_tool(
        &config.downloader_name,
        config.downloader_path.as_deref(),
        config.search_path,
    )
}

/// Locate the transcoder binary according to `config`
pub fn find_transcoder(config: &ToolsConfig) -> Result<PathBuf> {
    find_tool(
        &config.transcoder_name,
        config.transcoder_path.as_deref(),
        config.search_path,
    )
}

/// Find `name` in: `explicit` (if set, exclusively), the directory of the
/// running executable, the current working directory, then `PATH`.
///
/// The platform executable suffix is appended when probing directories.
pub fn find_tool(name: &str, explicit: Option<&Path>, search_path: bool) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ToolError::NotFound {
            tool: name.to_string(),
            searched: vec![path.to_path_buf()],
        }
        .into());
    }

    let file_name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
    let mut searched = Vec::new();

    for dir in [exe_dir(), std::env::current_dir().ok()].into_iter().flatten() {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            debug!(tool = name, path = ?candidate, "found tool");
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    if search_path {
        if let Ok(path) = which::which(name) {
            debug!(tool = name, ?path, "found tool in PATH");
            return Ok(path);
        }
        searched.push(PathBuf::from("$PATH"));
    }

    Err(ToolError::NotFound {
        tool: name.to_string(),
        searched,
    }
    .into())
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
