//! Scratch directory layout and output commits.
//!
//! Every stage writes `{identifier}-{stage}.{ext}` into the scratch directory.
//! The engine first writes to a `.partial` sibling which is renamed into place
//! only after it succeeds, so an existing stage output is always complete and
//! later runs can reuse it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Final location of a stage output.
///
/// For example: `/scratch`, `PXL_20230401`, `stabilized`, `mp4` ->
/// `/scratch/PXL_20230401-stabilized.mp4`
pub fn stage_output_path(scratch_dir: &Path, identifier: &str, stage: &str, extension: &str) -> PathBuf {
    scratch_dir.join(format!("{}-{}.{}", identifier, stage, extension))
}

/// In-progress location of a stage output.
///
/// The extension stays last so ffmpeg still picks the right muxer.
pub fn partial_output_path(scratch_dir: &Path, identifier: &str, stage: &str, extension: &str) -> PathBuf {
    scratch_dir.join(format!("{}-{}.partial.{}", identifier, stage, extension))
}

/// Move a finished partial output to its final path.
///
/// Rename is tried first; copy-then-remove is the fallback for filesystems
/// where rename fails.
pub fn commit_output(partial: &Path, final_path: &Path) -> io::Result<()> {
    if fs::rename(partial, final_path).is_ok() {
        return Ok(());
    }

    fs::copy(partial, final_path)?;
    fs::remove_file(partial)
}

/// Remove a partial output left behind by a failed or interrupted run.
///
/// A missing file is not an error.
pub fn discard_partial(partial: &Path) -> io::Result<()> {
    match fs::remove_file(partial) {
        Ok(()) => {
            warn!(path = %partial.display(), "removed incomplete output");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
