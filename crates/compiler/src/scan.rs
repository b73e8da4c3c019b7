//! Scanner module for discovering the input clips.
//!
//! Lists the top level of the input directory, skipping hidden files and
//! anything that does not carry a video extension.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Video file extensions supported by the scanner (case-insensitive matching).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mov", ".m4v", ".mkv", ".avi", ".3gp", ".webm", ".mts", ".ts",
];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to list input directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Checks if a file has a video extension (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = format!(".{}", ext.to_lowercase());
            VIDEO_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Returns the video files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. A missing or unreadable directory
/// is an error rather than an empty result.
pub fn scan_input_dir(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut videos = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() || is_hidden(path) || !is_video_file(path) {
            continue;
        }

        videos.push(path.to_path_buf());
    }

    Ok(videos)
}
