//! Final assembly: concatenates the finished clips into the output video.

use crate::collection::AssetCollection;
use crate::engine::MediaEngine;
use crate::ffmpeg::{EncodeError, FfmpegInvocation, FilterGraph, InputSpec, OutputTarget};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Concatenation failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Concatenation produced no file at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// `{YYYY-MM-DD-HH-MM-SS}-{name}.mp4`, with spaces in the name turned into `-`
pub fn output_file_name(kid_name: &str, created: NaiveDateTime) -> String {
    format!(
        "{}-{}.mp4",
        created.format("%Y-%m-%d-%H-%M-%S"),
        kid_name.replace(' ', "-")
    )
}

/// One invocation joining every clip in `collection`, in sorted order.
pub fn concat_invocation(collection: &AssetCollection, reverse: bool, output: &Path) -> FfmpegInvocation {
    let clips = collection.sorted(reverse);

    let mut graph: String = (0..clips.len()).map(|i| format!("[{}:v]", i)).collect();
    graph.push_str(&format!("concat=n={}:v=1:a=0[out]", clips.len()));

    let mut invocation = FfmpegInvocation::new(OutputTarget::Encode(output.to_path_buf()));
    for clip in clips {
        invocation = invocation.input(InputSpec::new(&clip.path));
    }
    invocation.filter(FilterGraph::Complex {
        graph,
        output_label: "out".to_string(),
    })
}

/// Write the final video into `output_dir` and return its path.
///
/// An existing file with the same name is overwritten.
pub fn assemble<E: MediaEngine + ?Sized>(
    engine: &E,
    collection: &AssetCollection,
    reverse: bool,
    output_dir: &Path,
    kid_name: &str,
    created: NaiveDateTime,
    show_commands: bool,
) -> Result<PathBuf, AssembleError> {
    fs::create_dir_all(output_dir).map_err(|source| AssembleError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let output = output_dir.join(output_file_name(kid_name, created));
    let invocation = concat_invocation(collection, reverse, &output);

    info!(clips = collection.len(), reverse, path = %output.display(), "assembling timelapse");
    let command_line = invocation.command_line();
    if show_commands {
        info!(command = %command_line, "ffmpeg");
    } else {
        debug!(command = %command_line, "ffmpeg");
    }

    engine.execute(&invocation)?;

    if !output.exists() {
        return Err(AssembleError::MissingOutput(output));
    }
    Ok(output)
}
