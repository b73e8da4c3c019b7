//! Pipeline driver
//!
//! Loads the input clips, runs every stage in order and writes the final
//! timelapse:
//! 1. Scan and inspect the input directory
//! 2. Compute the duration budget once
//! 3. Head-tail stage
//! 4. Stabilization (detect + transform), when enabled
//! 5. Filter stage
//! 6. Concatenate into the output directory

use crate::asset::MediaAsset;
use crate::assemble::{assemble, AssembleError};
use crate::budget::{BudgetError, DurationBudget};
use crate::caption::age_label;
use crate::collection::{AssetCollection, CollectionError};
use crate::engine::MediaEngine;
use crate::filters::{FilterComposer, FilterStage};
use crate::headtail::HeadTailStage;
use crate::inspect::InspectError;
use crate::scan::{scan_input_dir, ScanError};
use crate::stabilize::stabilize;
use crate::stage::{StageError, StageRunner};
use chrono::Local;
use kids_timelapse_config::{Config, ConfigError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Error type for a compile run
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Inspection failed: {0}")]
    Inspect(#[from] InspectError),

    #[error("{0}")]
    Collection(#[from] CollectionError),

    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    #[error("{0}")]
    Stage(#[from] StageError),

    #[error("Assembly failed: {0}")]
    Assemble(#[from] AssembleError),
}

/// Compiles one timelapse from a validated configuration
pub struct TimelapseCompiler<E: MediaEngine> {
    config: Config,
    engine: E,
}

impl<E: MediaEngine> TimelapseCompiler<E> {
    /// Validate `config` and bind it to `engine`
    pub fn new(config: Config, engine: E) -> Result<Self, CompileError> {
        config.validate()?;
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Inspect every video in the input directory
    pub fn load_collection(&self) -> Result<AssetCollection, CompileError> {
        let input_dir = &self.config.directories.input_videos;
        info!(path = %input_dir.display(), "loading videos");

        let assets = scan_input_dir(input_dir)?
            .iter()
            .map(|path| self.engine.inspect(path, None))
            .collect::<Result<Vec<MediaAsset>, _>>()?;

        Ok(AssetCollection::new(assets)?)
    }

    /// `"{age caption} - {identifier}"` per clip, oldest first
    pub fn week_listing(&self, collection: &AssetCollection) -> Vec<String> {
        let birthday = self.config.kid_info.birthday;
        collection
            .sorted(false)
            .into_iter()
            .map(|asset| format!("{} - {}", age_label(asset.capture_date, birthday), asset.identifier))
            .collect()
    }

    /// Log each clip's age caption in chronological order
    pub fn list_weeks(&self, collection: &AssetCollection) {
        for line in self.week_listing(collection) {
            info!("{}", line);
        }
    }

    /// Run every per-clip stage, returning the finished clips
    pub fn compile(&self, collection: &AssetCollection) -> Result<AssetCollection, CompileError> {
        let budget = DurationBudget::from_config(&self.config, collection.len())?;
        info!(
            max_per_clip_secs = budget.max_per_clip_length,
            head_secs = budget.head_length,
            tail_secs = budget.tail_length,
            speed_up_factor = budget.speed_up_factor,
            "duration budget"
        );

        let runner = StageRunner::new(
            &self.engine,
            &self.config.directories.scratch,
            self.config.compiler_options.show_ffmpeg_commands,
        );

        let mut clips = runner.run(
            &HeadTailStage::new(budget, self.config.timelapse_video.max_width),
            collection,
        )?;

        if self.config.timelapse_options.video_stabilization {
            clips = stabilize(&runner, &self.config.stabilization, &clips)?;
        }

        let filters = FilterStage::new(FilterComposer::from_config(&self.config));
        Ok(runner.run(&filters, &clips)?)
    }

    /// Concatenate the finished clips into a new timestamped output file
    pub fn save(&self, clips: &AssetCollection) -> Result<PathBuf, CompileError> {
        Ok(assemble(
            &self.engine,
            clips,
            self.config.timelapse_options.reverse,
            &self.config.directories.output_video,
            &self.config.kid_info.name,
            Local::now().naive_local(),
            self.config.compiler_options.show_ffmpeg_commands,
        )?)
    }

    /// Load, compile and save; returns the path of the written timelapse
    pub fn run(&self) -> Result<PathBuf, CompileError> {
        let collection = self.load_collection()?;
        collection.log_summary();
        if self.config.compiler_options.list_weeks {
            self.list_weeks(&collection);
        }

        let clips = self.compile(&collection)?;
        let output = self.save(&clips)?;
        info!(path = %output.display(), "timelapse written");
        Ok(output)
    }
}
