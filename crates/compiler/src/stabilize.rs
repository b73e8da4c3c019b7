//! Two-pass vid.stab stabilization.
//!
//! The detect pass analyses camera motion into a `.trf` side-car per clip;
//! the transform pass reads it back and writes the stabilized clip.

use crate::asset::MediaAsset;
use crate::collection::AssetCollection;
use crate::engine::MediaEngine;
use crate::ffmpeg::{escape_filter_value, FfmpegInvocation, FilterGraph, InputSpec, OutputTarget};
use crate::plan::PlanError;
use crate::scratch::stage_output_path;
use crate::stage::{OutputKind, Stage, StageError, StageRunner};
use kids_timelapse_config::StabilizationOptions;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DETECT_STAGE: &str = "stabilized-data";
pub const TRANSFORM_STAGE: &str = "stabilized";
pub const TRANSFORMS_EXTENSION: &str = "trf";

/// Where the detect pass leaves the transforms for `identifier`
pub fn transforms_path(scratch_dir: &Path, identifier: &str) -> PathBuf {
    stage_output_path(scratch_dir, identifier, DETECT_STAGE, TRANSFORMS_EXTENSION)
}

#[derive(Debug, Clone, Copy)]
pub struct DetectStage {
    shakiness: u32,
}

impl DetectStage {
    pub fn new(shakiness: u32) -> Self {
        Self { shakiness }
    }
}

impl Stage for DetectStage {
    fn name(&self) -> &str {
        DETECT_STAGE
    }

    fn extension(&self) -> &str {
        TRANSFORMS_EXTENSION
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Sidecar
    }

    fn build(&self, asset: &MediaAsset, output: &Path) -> Result<FfmpegInvocation, PlanError> {
        let filter = format!(
            "vidstabdetect=shakiness={}:result={}",
            self.shakiness,
            escape_filter_value(&output.to_string_lossy())
        );
        Ok(FfmpegInvocation::new(OutputTarget::Sidecar(output.to_path_buf()))
            .input(InputSpec::new(&asset.path))
            .filter(FilterGraph::Chain(filter)))
    }
}

#[derive(Debug, Clone)]
pub struct TransformStage {
    smoothing: u32,
    scratch_dir: PathBuf,
}

impl TransformStage {
    pub fn new(smoothing: u32, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            smoothing,
            scratch_dir: scratch_dir.into(),
        }
    }
}

impl Stage for TransformStage {
    fn name(&self) -> &str {
        TRANSFORM_STAGE
    }

    fn build(&self, asset: &MediaAsset, output: &Path) -> Result<FfmpegInvocation, PlanError> {
        let transforms = transforms_path(&self.scratch_dir, &asset.identifier);
        let filter = format!(
            "vidstabtransform=smoothing={}:input={}",
            self.smoothing,
            escape_filter_value(&transforms.to_string_lossy())
        );
        Ok(FfmpegInvocation::new(OutputTarget::Encode(output.to_path_buf()))
            .input(InputSpec::new(&asset.path))
            .filter(FilterGraph::Chain(filter)))
    }
}

/// Run both passes over `collection`, returning the stabilized clips.
pub fn stabilize<E: MediaEngine + ?Sized>(
    runner: &StageRunner<'_, E>,
    options: &StabilizationOptions,
    collection: &AssetCollection,
) -> Result<AssetCollection, StageError> {
    info!(
        shakiness = options.shakiness,
        smoothing = options.smoothing,
        "stabilizing clips"
    );

    let analysed = runner.run(&DetectStage::new(options.shakiness), collection)?;
    runner.run(
        &TransformStage::new(options.smoothing, runner.scratch_dir()),
        &analysed,
    )
}
