//! Stage runner.
//!
//! A stage turns one asset into one scratch file. The runner applies a stage
//! to every member of a collection in ascending identifier order, skipping
//! assets whose output already exists, and returns the collection of outputs.

use crate::asset::MediaAsset;
use crate::collection::{AssetCollection, CollectionError};
use crate::engine::MediaEngine;
use crate::ffmpeg::{EncodeError, FfmpegInvocation};
use crate::inspect::InspectError;
use crate::plan::PlanError;
use crate::scratch::{commit_output, discard_partial, partial_output_path, stage_output_path};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StageError {
    #[error("Stage '{stage}' could not plan {identifier}: {source}")]
    Plan {
        stage: String,
        identifier: String,
        source: PlanError,
    },

    #[error("Stage '{stage}' failed for {identifier}: {source}")]
    Encode {
        stage: String,
        identifier: String,
        source: EncodeError,
    },

    #[error("Stage '{stage}' produced no output for {identifier} at {}", .path.display())]
    MissingOutput {
        stage: String,
        identifier: String,
        path: PathBuf,
    },

    #[error("Stage '{stage}' could not commit output for {identifier}: {source}")]
    Commit {
        stage: String,
        identifier: String,
        source: std::io::Error,
    },

    #[error("Stage '{stage}' output for {identifier} could not be inspected: {source}")]
    Inspect {
        stage: String,
        identifier: String,
        source: InspectError,
    },

    #[error("Failed to create scratch directory {}: {source}", .path.display())]
    ScratchDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// What a stage leaves in the scratch directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A video that becomes the asset's next version
    Media,
    /// Auxiliary data for a later stage; the asset passes through unchanged
    Sidecar,
}

/// A named one-asset-in, one-file-out transform
pub trait Stage {
    /// Suffix in `{identifier}-{name}.{extension}`
    fn name(&self) -> &str;

    fn extension(&self) -> &str {
        "mp4"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Media
    }

    /// Describe the engine work that writes `asset`'s output to `output`.
    fn build(&self, asset: &MediaAsset, output: &Path) -> Result<FfmpegInvocation, PlanError>;
}

/// Applies stages against one scratch directory with one engine.
pub struct StageRunner<'a, E: MediaEngine + ?Sized> {
    engine: &'a E,
    scratch_dir: &'a Path,
    show_commands: bool,
}

impl<'a, E: MediaEngine + ?Sized> StageRunner<'a, E> {
    pub fn new(engine: &'a E, scratch_dir: &'a Path, show_commands: bool) -> Self {
        Self {
            engine,
            scratch_dir,
            show_commands,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch_dir
    }

    /// Run `stage` over every asset, stopping at the first failure.
    ///
    /// Outputs that already exist are reused without invoking the engine.
    pub fn run(&self, stage: &dyn Stage, collection: &AssetCollection) -> Result<AssetCollection, StageError> {
        fs::create_dir_all(self.scratch_dir).map_err(|source| StageError::ScratchDir {
            path: self.scratch_dir.to_path_buf(),
            source,
        })?;

        info!(stage = stage.name(), clips = collection.len(), "running stage");

        let mut outputs = Vec::with_capacity(collection.len());
        for asset in collection.sorted(false) {
            outputs.push(self.run_one(stage, asset)?);
        }

        Ok(AssetCollection::new(outputs)?)
    }

    fn run_one(&self, stage: &dyn Stage, asset: &MediaAsset) -> Result<MediaAsset, StageError> {
        let identifier = asset.identifier.as_str();
        let final_path = stage_output_path(self.scratch_dir, identifier, stage.name(), stage.extension());

        if final_path.exists() {
            debug!(stage = stage.name(), identifier, path = %final_path.display(), "output exists, skipping");
        } else {
            self.produce(stage, asset, &final_path)?;
        }

        match stage.output_kind() {
            OutputKind::Sidecar => Ok(asset.clone()),
            OutputKind::Media => self
                .engine
                .inspect(&final_path, Some(identifier))
                .map_err(|source| StageError::Inspect {
                    stage: stage.name().to_string(),
                    identifier: identifier.to_string(),
                    source,
                }),
        }
    }

    fn produce(&self, stage: &dyn Stage, asset: &MediaAsset, final_path: &Path) -> Result<(), StageError> {
        let identifier = asset.identifier.as_str();
        let commit_error = |source: std::io::Error| StageError::Commit {
            stage: stage.name().to_string(),
            identifier: identifier.to_string(),
            source,
        };

        let partial = partial_output_path(self.scratch_dir, identifier, stage.name(), stage.extension());
        discard_partial(&partial).map_err(commit_error)?;

        let invocation = stage.build(asset, &partial).map_err(|source| StageError::Plan {
            stage: stage.name().to_string(),
            identifier: identifier.to_string(),
            source,
        })?;

        info!(stage = stage.name(), identifier, "processing");
        let command_line = invocation.command_line();
        if self.show_commands {
            info!(command = %command_line, "ffmpeg");
        } else {
            debug!(command = %command_line, "ffmpeg");
        }

        if let Err(source) = self.engine.execute(&invocation) {
            if let Err(e) = discard_partial(&partial) {
                warn!(path = %partial.display(), error = %e, "could not remove incomplete output");
            }
            return Err(StageError::Encode {
                stage: stage.name().to_string(),
                identifier: identifier.to_string(),
                source,
            });
        }

        if !partial.exists() {
            return Err(StageError::MissingOutput {
                stage: stage.name().to_string(),
                identifier: identifier.to_string(),
                path: partial,
            });
        }

        commit_output(&partial, final_path).map_err(commit_error)
    }
}
