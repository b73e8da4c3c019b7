//! Media asset records produced by the inspector.

use chrono::NaiveDate;
use std::path::PathBuf;

/// One input or intermediate clip tracked by the pipeline.
///
/// Records are never mutated once inspected; each stage produces a new record
/// carrying the same `identifier` so its output can be matched back to the
/// original clip.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    /// Base name of the original file, stable across stages.
    pub identifier: String,
    /// Location of the file this record describes.
    pub path: PathBuf,
    /// Day the clip was recorded (parsed from the name, or the probe day).
    pub capture_date: NaiveDate,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// BT.2020 primaries, needs tone-mapping before overlays.
    pub hdr: bool,
    /// Raw ffprobe description of the video stream.
    pub probe: serde_json::Value,
}
