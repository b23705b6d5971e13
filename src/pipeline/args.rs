//! Command lines for the downloader and transcoder

use crate::presets::Profile;
use crate::types::TrimWindow;
use std::ffi::OsString;
use std::path::Path;

/// File stem of the raw download inside the working directory
pub(crate) const RAW_STEM: &str = "video-temp";

/// Downloader output template extension placeholder
const EXT_PLACEHOLDER: &str = ".%(ext)s";

/// Fetch into `<prefix>.<ext>`, merging the selected streams into one container
pub(crate) fn fetch_merged(
    prefix: &Path,
    format_selector: &str,
    merge_output_format: &str,
    url: &str,
) -> Vec<OsString> {
    vec![
        "-o".into(),
        output_template(prefix),
        "-f".into(),
        format_selector.into(),
        "--merge-output-format".into(),
        merge_output_format.into(),
        "--".into(),
        url.into(),
    ]
}

/// Fetch the native best stream into `<work_dir>/video-temp.<ext>`
pub(crate) fn fetch_raw(work_dir: &Path, url: &str) -> Vec<OsString> {
    vec![
        "-o".into(),
        output_template(&work_dir.join(RAW_STEM)),
        "--".into(),
        url.into(),
    ]
}

/// Transcode `input` into `output` with `profile`, optionally cut to `trim`
pub(crate) fn transcode(
    input: &Path,
    trim: Option<TrimWindow>,
    profile: Profile,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-loglevel".into(), "info".into()];
    if let Some(window) = trim {
        // seeking before -i is input seeking: fast, keyframe-aligned
        args.extend([
            "-ss".into(),
            window.start.to_string().into(),
            "-to".into(),
            window.end.to_string().into(),
        ]);
    }
    args.push("-i".into());
    args.push(input.as_os_str().to_owned());
    args.extend(profile.transcode_args().into_iter().map(OsString::from));
    if !profile.is_audio_only() {
        args.extend(["-avoid_negative_ts".into(), "make_zero".into()]);
    }
    args.push("-y".into());
    args.push(output.as_os_str().to_owned());
    args
}

/// `<prefix>.%(ext)s` with literal `%` in the prefix escaped for the template engine
fn output_template(prefix: &Path) -> OsString {
    let mut template = match prefix.to_str() {
        Some(prefix) => OsString::from(prefix.replace('%', "%%")),
        None => prefix.as_os_str().to_owned(),
    };
    template.push(EXT_PLACEHOLDER);
    template
}
