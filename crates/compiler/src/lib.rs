//! Kids Timelapse
//!
//! Turns a directory of phone clips into one short timelapse: every clip is
//! trimmed and sped up to fit a target length, optionally stabilized, cropped
//! and captioned with the kid's age, then concatenated.

pub mod assemble;
pub mod asset;
pub mod budget;
pub mod caption;
pub mod collection;
pub mod compiler;
pub mod engine;
pub mod ffmpeg;
pub mod filters;
pub mod headtail;
pub mod inspect;
pub mod plan;
pub mod scan;
pub mod scratch;
pub mod stabilize;
pub mod stage;
pub mod startup;

#[cfg(test)]
mod testing;

pub use kids_timelapse_config as config;
pub use kids_timelapse_config::Config;
pub use assemble::{assemble, concat_invocation, output_file_name, AssembleError};
pub use asset::MediaAsset;
pub use budget::{BudgetError, DurationBudget};
pub use caption::{age_label, CaptionPosition};
pub use collection::{AssetCollection, CollectionError};
pub use compiler::{CompileError, TimelapseCompiler};
pub use engine::{Ffmpeg, MediaEngine};
pub use ffmpeg::{
    build_ffmpeg_command, run_ffmpeg, EncodeError, FfmpegInvocation, FilterGraph, InputSpec,
    OutputTarget,
};
pub use filters::{render_filter_chain, FilterComposer, FilterStage, FilterStep};
pub use headtail::HeadTailStage;
pub use inspect::{inspect_file, parse_ffprobe_output, InspectError};
pub use plan::{plan_clip, PlanError, TransformPlan};
pub use scan::{scan_input_dir, ScanError};
pub use stabilize::{stabilize, DetectStage, TransformStage};
pub use stage::{OutputKind, Stage, StageError, StageRunner};
pub use startup::{parse_ffmpeg_version, run_startup_checks, StartupError};
