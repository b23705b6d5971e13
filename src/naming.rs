//! Output file naming from the resource title

use crate::error::{Error, Result};
use crate::tools::ToolRunner;
use std::ffi::OsString;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Longest base name produced by [`sanitize_filename`], in characters
pub const MAX_NAME_CHARS: usize = 150;

/// Name used when sanitization leaves nothing
const EMPTY_NAME: &str = "video";

/// Turn an arbitrary title into a filesystem-safe base name
///
/// Reserved characters (`< > : " / \ | ? *`) and control characters are
/// replaced with `_`, whitespace runs collapse to a single space, the result
/// is trimmed and capped at [`MAX_NAME_CHARS`] characters. Applying it twice
/// yields the same result as applying it once.
///
/// # Examples
///
/// ```
/// use media_dl::naming::sanitize_filename;
///
/// assert_eq!(sanitize_filename("  AC/DC: Live?  "), "AC_DC_ Live_");
/// assert_eq!(sanitize_filename("   "), "video");
/// ```
#[must_use]
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .trim()
        .chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return EMPTY_NAME.to_string();
    }

    let truncated: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
    // cutting mid-title can leave a trailing space
    truncated.trim_end().to_string()
}

fn is_reserved(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || ('\0'..='\x1f').contains(&c)
}

/// Fallback base name: `video-YYYYMMDD-HHMMSS` in local time
#[must_use]
pub fn timestamp_name() -> String {
    format!("video-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"))
}

/// Resolve the base name for `url`
///
/// Asks the downloader for the title; any failure other than cancellation
/// falls back to [`timestamp_name`]. Cancellation is propagated so the job
/// stops before fetching anything.
pub async fn resolve_base_name(
    runner: &dyn ToolRunner,
    downloader: &Path,
    url: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let args: Vec<OsString> = vec![
        "--get-title".into(),
        "--no-playlist".into(),
        "--".into(),
        url.into(),
    ];

    match runner.run(downloader, &args, cancel).await {
        Ok(output) => {
            let title = output.stdout.trim();
            if title.is_empty() {
                let name = timestamp_name();
                debug!(%name, "downloader returned an empty title, using timestamp name");
                return Ok(name);
            }
            Ok(sanitize_filename(title))
        }
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            let name = timestamp_name();
            warn!(error = %e, %name, "title lookup failed, using timestamp name");
            Ok(name)
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tools::ToolOutput;
    use async_trait::async_trait;

    const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    fn samples() -> Vec<String> {
        vec![
            "Simple Title".into(),
            "  padded  ".into(),
            "a<b>c:d\"e/f\\g|h?i*j".into(),
            "tabs\tand\nnewlines\r\n".into(),
            "\u{1}\u{2}control\u{1f}".into(),
            "multiple     inner    spaces".into(),
            "".into(),
            "   ".into(),
            "???".into(),
            "x".repeat(400),
            format!("{} tail", "y".repeat(149)),
            "日本語のタイトル — 特別編".repeat(20),
            "trailing dots...".into(),
            "\u{a0}nbsp\u{a0}\u{a0}wrapped\u{a0}".into(),
        ]
    }

    #[test]
    fn test_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_control_characters_become_underscores() {
        assert_eq!(sanitize_filename("a\u{0}b\u{1b}c"), "a_b_c");
        // tabs and newlines are control characters, replaced before whitespace collapsing
        assert_eq!(sanitize_filename("a\tb\nc"), "a_b_c");
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(sanitize_filename("  My   Great \u{a0} Video  "), "My Great Video");
    }

    #[test]
    fn test_empty_becomes_video() {
        assert_eq!(sanitize_filename(""), "video");
        assert_eq!(sanitize_filename(" \u{a0} "), "video");
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let long = "é".repeat(300);
        let name = sanitize_filename(&long);
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_space() {
        let title = format!("{} tail", "y".repeat(149));
        let name = sanitize_filename(&title);
        assert_eq!(name, "y".repeat(149));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for sample in samples() {
            let once = sanitize_filename(&sample);
            assert_eq!(sanitize_filename(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn test_output_never_contains_forbidden_characters() {
        for sample in samples() {
            let name = sanitize_filename(&sample);
            assert!(!name.is_empty());
            assert!(name.chars().count() <= MAX_NAME_CHARS, "{name:?}");
            assert!(
                !name.chars().any(|c| RESERVED.contains(&c) || (c as u32) < 0x20),
                "{name:?}"
            );
        }
    }

    #[test]
    fn test_timestamp_name_format() {
        let name = timestamp_name();
        let stamp = name.strip_prefix("video-").unwrap();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "-");
        assert!(stamp.chars().filter(|c| *c != '-').all(|c| c.is_ascii_digit()));
    }

    enum TitleBehavior {
        Title(&'static str),
        Fail,
        Cancelled,
    }

    struct TitleRunner(TitleBehavior);

    #[async_trait]
    impl ToolRunner for TitleRunner {
        async fn run(
            &self,
            _tool: &Path,
            args: &[OsString],
            _cancel: &CancellationToken,
        ) -> crate::Result<ToolOutput> {
            assert_eq!(args[0], "--get-title");
            assert_eq!(args[1], "--no-playlist");
            assert_eq!(args[3], "https://example.com/v");
            match self.0 {
                TitleBehavior::Title(title) => Ok(ToolOutput {
                    stdout: format!("{title}\n"),
                    stderr: "WARNING: something noisy".into(),
                }),
                TitleBehavior::Fail => Err(ToolError::Failed {
                    tool: "yt-dlp".into(),
                    exit_code: Some(1),
                    log: "ERROR: unsupported URL".into(),
                }
                .into()),
                TitleBehavior::Cancelled => Err(Error::Cancelled),
            }
        }

        fn name(&self) -> &'static str {
            "title-test"
        }
    }

    async fn resolve(behavior: TitleBehavior) -> Result<String> {
        let runner = TitleRunner(behavior);
        resolve_base_name(
            &runner,
            Path::new("yt-dlp"),
            "https://example.com/v",
            &CancellationToken::new(),
        )
        .await
    }

    #[tokio::test]
    async fn test_resolve_uses_sanitized_stdout_title() {
        let name = resolve(TitleBehavior::Title("Live: Part 1/2")).await.unwrap();
        assert_eq!(name, "Live_ Part 1_2");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_failure() {
        let name = resolve(TitleBehavior::Fail).await.unwrap();
        assert!(name.starts_with("video-"), "{name}");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_empty_title() {
        let name = resolve(TitleBehavior::Title("   ")).await.unwrap();
        assert!(name.starts_with("video-"), "{name}");
    }

    #[tokio::test]
    async fn test_resolve_propagates_cancellation() {
        assert!(matches!(
            resolve(TitleBehavior::Cancelled).await,
            Err(Error::Cancelled)
        ));
    }
}
