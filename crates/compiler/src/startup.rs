//! Startup checks
//!
//! Verifies the external tools before any clip is touched:
//! - ffmpeg and ffprobe run
//! - the ffmpeg version is parsed and logged
//! - the caption and tone-mapping filters are compiled in, plus the vid.stab
//!   filters when stabilization is enabled

use kids_timelapse_config::Config;
use std::process::Command;
use thiserror::Error;
use tracing::{info, warn};

/// Filters every run relies on: captions and HDR tone mapping
pub const BASE_FILTERS: &[&str] = &["drawtext", "zscale", "tonemap"];
/// Filters the stabilization passes rely on
pub const STABILIZATION_FILTERS: &[&str] = &["vidstabdetect", "vidstabtransform"];

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{tool} not available: {message}")]
    ToolUnavailable { tool: String, message: String },

    #[error("ffmpeg lacks the '{0}' filter; {}", filter_hint(.0))]
    MissingFilter(String),
}

/// Which ffmpeg build option provides `filter`
fn filter_hint(filter: &str) -> &'static str {
    match filter {
        "drawtext" => "captions need an ffmpeg built with libfreetype",
        "zscale" => "HDR tone mapping needs an ffmpeg built with libzimg",
        "vidstabdetect" | "vidstabtransform" => "stabilization needs an ffmpeg built with libvidstab",
        _ => "rebuild ffmpeg with it enabled",
    }
}

/// Run `<tool> <args...>` and return its stdout
fn tool_output(tool: &str, args: &[&str]) -> Result<String, StartupError> {
    let output = Command::new(tool).args(args).output().map_err(|e| {
        StartupError::ToolUnavailable {
            tool: tool.to_string(),
            message: format!("{} {} failed; is it installed and in PATH? Error: {}", tool, args.join(" "), e),
        }
    })?;

    if !output.status.success() {
        return Err(StartupError::ToolUnavailable {
            tool: tool.to_string(),
            message: format!("{} {} exited with {}", tool, args.join(" "), output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check that `tool -version` runs, returning its output
pub fn check_tool_available(tool: &str) -> Result<String, StartupError> {
    tool_output(tool, &["-version"])
}

/// Parse FFmpeg version string and extract major version number
///
/// Handles various FFmpeg version formats:
/// - Standard: "ffmpeg version 6.1 ..."
/// - N-prefixed: "ffmpeg version n6.1-... ..."
///
/// Git snapshot builds ("ffmpeg version N-112233-g...") carry no release
/// number and yield `None`.
pub fn parse_ffmpeg_version(version_output: &str) -> Option<u32> {
    let version_line = version_output
        .lines()
        .find(|line| line.to_lowercase().contains("ffmpeg version"))?;

    let version_part = version_line
        .to_lowercase()
        .split("ffmpeg version")
        .nth(1)?
        .split_whitespace()
        .next()?
        .to_string();

    let version_str = version_part.trim_start_matches('n');

    // Major version sits before the first '.' or '-'
    let major_str = version_str.split(['.', '-']).next()?;

    major_str.parse().ok()
}

/// Whether `ffmpeg -filters` output lists `name`
///
/// Filter lines look like ` T.C vidstabdetect     V->V  Extract ...`.
pub fn has_filter(filters_output: &str, name: &str) -> bool {
    filters_output
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

/// Filters a run with `cfg` needs from ffmpeg
pub fn required_filters(cfg: &Config) -> Vec<&'static str> {
    let mut filters = BASE_FILTERS.to_vec();
    if cfg.timelapse_options.video_stabilization {
        filters.extend_from_slice(STABILIZATION_FILTERS);
    }
    filters
}

/// First of `required` that `filters_output` does not list
pub fn first_missing_filter<'a>(filters_output: &str, required: &[&'a str]) -> Option<&'a str> {
    required
        .iter()
        .copied()
        .find(|name| !has_filter(filters_output, name))
}

/// Run all startup checks in order
///
/// 1. ffmpeg availability and version
/// 2. ffprobe availability
/// 3. required filters (see [`required_filters`])
pub fn run_startup_checks(cfg: &Config) -> Result<(), StartupError> {
    let version_output = check_tool_available("ffmpeg")?;
    match parse_ffmpeg_version(&version_output) {
        Some(major) => info!(major, "found ffmpeg"),
        None => warn!(
            version = version_output.lines().next().unwrap_or("(empty)"),
            "could not parse ffmpeg version"
        ),
    }

    check_tool_available("ffprobe")?;

    let filters = tool_output("ffmpeg", &["-hide_banner", "-filters"])?;
    if let Some(name) = first_missing_filter(&filters, &required_filters(cfg)) {
        return Err(StartupError::MissingFilter(name.to_string()));
    }

    Ok(())
}
