//! The media engine seam.
//!
//! Stages describe work as [`FfmpegInvocation`]s and hand them to an engine.
//! [`Ffmpeg`] runs the real binaries; tests substitute an engine that records
//! invocations and fabricates outputs.

use crate::asset::MediaAsset;
use crate::ffmpeg::{run_ffmpeg, EncodeError, FfmpegInvocation};
use crate::inspect::{inspect_file, InspectError};
use std::path::Path;

pub trait MediaEngine {
    /// Describe the file at `path`; `identifier` overrides the name-derived one.
    fn inspect(&self, path: &Path, identifier: Option<&str>) -> Result<MediaAsset, InspectError>;

    /// Run one invocation to completion.
    fn execute(&self, invocation: &FfmpegInvocation) -> Result<(), EncodeError>;
}

/// Engine backed by the `ffmpeg` and `ffprobe` executables on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ffmpeg;

impl MediaEngine for Ffmpeg {
    fn inspect(&self, path: &Path, identifier: Option<&str>) -> Result<MediaAsset, InspectError> {
        inspect_file(path, identifier)
    }

    fn execute(&self, invocation: &FfmpegInvocation) -> Result<(), EncodeError> {
        run_ffmpeg(invocation)
    }
}
