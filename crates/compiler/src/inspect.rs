//! Media asset inspection.
//!
//! Probes files with ffprobe and turns the JSON description of the first
//! video stream into a [`MediaAsset`]. The capture date comes from the Pixel
//! camera naming scheme (`PXL_YYYYMMDD_...`) when present.

use crate::asset::MediaAsset;
use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use thiserror::Error;

/// Error type for inspection operations.
#[derive(Debug, Error)]
pub enum InspectError {
    /// ffprobe command failed to execute.
    #[error("ffprobe failed for {}: {message}", .path.display())]
    FfprobeFailed { path: PathBuf, message: String },

    /// Failed to parse ffprobe JSON output.
    #[error("Failed to parse ffprobe output for {}: {message}", .path.display())]
    ParseError { path: PathBuf, message: String },

    /// The file has no video stream.
    #[error("No video stream in {}", .0.display())]
    NoVideoStream(PathBuf),

    /// IO error during probe.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw ffprobe JSON structures for parsing.
mod ffprobe_json {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct FfprobeOutput {
        pub streams: Option<Vec<serde_json::Value>>,
        pub format: Option<Format>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Format {
        pub duration: Option<String>,
    }
}

#[derive(Debug, Deserialize)]
struct VideoStreamFields {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    color_primaries: Option<String>,
}

/// Identifier for a file name: everything before the first `.`.
pub fn identifier_from_file_name(file_name: &str) -> String {
    file_name.split('.').next().unwrap_or_default().to_string()
}

fn identifier_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| identifier_from_file_name(&name.to_string_lossy()))
        .unwrap_or_default()
}

fn capture_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"PXL_(\d{4})(\d{2})(\d{2})").expect("capture date pattern is a valid regex")
    })
}

/// Capture date encoded in a `PXL_YYYYMMDD` name, if any.
pub fn capture_date_from_name(name: &str) -> Option<NaiveDate> {
    let caps = capture_date_pattern().captures(name)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Runs `ffprobe -v quiet -print_format json -show_streams -show_format <path>`
/// and returns its stdout.
pub fn run_ffprobe(path: &Path) -> Result<String, InspectError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InspectError::FfprobeFailed {
            path: path.to_path_buf(),
            message: format!("exited with status {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parses ffprobe JSON output into a MediaAsset.
///
/// The stream duration is preferred; the container duration is the fallback
/// for formats that only report it there.
pub fn parse_ffprobe_output(
    json_str: &str,
    path: &Path,
    identifier: &str,
    capture_date: NaiveDate,
) -> Result<MediaAsset, InspectError> {
    let parse_error = |message: String| InspectError::ParseError {
        path: path.to_path_buf(),
        message,
    };

    let ffprobe: ffprobe_json::FfprobeOutput =
        serde_json::from_str(json_str).map_err(|e| parse_error(e.to_string()))?;

    let video = ffprobe
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|stream| stream.get("codec_type").and_then(|t| t.as_str()) == Some("video"))
        .ok_or_else(|| InspectError::NoVideoStream(path.to_path_buf()))?;

    let fields: VideoStreamFields =
        serde_json::from_value(video.clone()).map_err(|e| parse_error(e.to_string()))?;

    let format_duration = ffprobe.format.and_then(|f| f.duration);
    let duration_secs = fields
        .duration
        .as_deref()
        .or(format_duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| parse_error("missing duration".to_string()))?;

    Ok(MediaAsset {
        identifier: identifier.to_string(),
        path: path.to_path_buf(),
        capture_date,
        duration_secs,
        width: fields.width.unwrap_or(0),
        height: fields.height.unwrap_or(0),
        // "bt709" is what regular SDR phone footage reports
        hdr: fields.color_primaries.as_deref() == Some("bt2020"),
        probe: video,
    })
}

/// Inspect a file on disk.
///
/// `identifier` overrides the name-derived identifier; stages pass the
/// original clip's identifier so scratch outputs stay matched to their input.
pub fn inspect_file(path: &Path, identifier: Option<&str>) -> Result<MediaAsset, InspectError> {
    let identifier = identifier
        .map(str::to_string)
        .unwrap_or_else(|| identifier_from_path(path));
    let capture_date =
        capture_date_from_name(&identifier).unwrap_or_else(|| Local::now().date_naive());
    let path = std::fs::canonicalize(path)?;

    let json = run_ffprobe(&path)?;
    parse_ffprobe_output(&json, &path, &identifier, capture_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDR_PROBE: &str = r#"{
        "streams": [
            {"codec_type": "audio", "codec_name": "aac", "duration": "12.0"},
            {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
             "duration": "12.345", "color_primaries": "bt709"}
        ],
        "format": {"duration": "12.400000", "size": "1000"}
    }"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn test_parse_sdr_video() {
        let asset =
            parse_ffprobe_output(SDR_PROBE, Path::new("/in/clip.mp4"), "clip", date()).unwrap();

        assert_eq!(asset.identifier, "clip");
        assert_eq!(asset.path, PathBuf::from("/in/clip.mp4"));
        assert_eq!(asset.capture_date, date());
        assert!((asset.duration_secs - 12.345).abs() < 1e-9);
        assert_eq!((asset.width, asset.height), (1920, 1080));
        assert!(!asset.hdr);
        assert_eq!(asset.probe["codec_name"], "h264");
    }

    #[test]
    fn test_parse_hdr_video_with_format_duration_fallback() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 3840, "height": 2160,
                         "color_primaries": "bt2020"}],
            "format": {"duration": "8.5"}
        }"#;
        let asset = parse_ffprobe_output(json, Path::new("/in/hdr.mp4"), "hdr", date()).unwrap();

        assert!(asset.hdr);
        assert_eq!(asset.duration_secs, 8.5);
    }

    #[test]
    fn test_parse_without_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let result = parse_ffprobe_output(json, Path::new("/in/a.m4a"), "a", date());
        assert!(matches!(result, Err(InspectError::NoVideoStream(_))));
    }

    #[test]
    fn test_parse_without_any_duration() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 10, "height": 10}]}"#;
        let result = parse_ffprobe_output(json, Path::new("/in/x.mp4"), "x", date());
        assert!(matches!(result, Err(InspectError::ParseError { .. })));
    }

    #[test]
    fn test_parse_garbage() {
        let result = parse_ffprobe_output("not json", Path::new("/in/x.mp4"), "x", date());
        assert!(matches!(result, Err(InspectError::ParseError { .. })));
    }

    #[test]
    fn test_identifier_from_file_name() {
        assert_eq!(identifier_from_file_name("PXL_20230401_101010.mp4"), "PXL_20230401_101010");
        assert_eq!(identifier_from_file_name("clip.final.mov"), "clip");
        assert_eq!(identifier_from_file_name("noext"), "noext");
    }

    #[test]
    fn test_capture_date_from_name() {
        assert_eq!(
            capture_date_from_name("PXL_20230401_101010"),
            NaiveDate::from_ymd_opt(2023, 4, 1)
        );
        assert_eq!(
            capture_date_from_name("PXL_20230401_101010-unstabilized"),
            NaiveDate::from_ymd_opt(2023, 4, 1)
        );
        assert_eq!(capture_date_from_name("VID_20230401"), None);
        assert_eq!(capture_date_from_name("PXL_20231301_000000"), None);
    }
}
