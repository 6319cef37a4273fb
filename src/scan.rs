//! Discovery of model files under a directory.

use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use walkdir::WalkDir;

/// File name pattern for model weight files.
pub const MODEL_FILE_PATTERN: &str = "*.safetensors";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("dir not found: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Recursively finds model files under `dir`, sorted by path.
///
/// Entries that cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns `ScanError::NotADirectory` if `dir` is not an existing directory.
pub fn find_model_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let pattern = Pattern::new(MODEL_FILE_PATTERN)?;

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| pattern.matches(&e.file_name().to_string_lossy()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    Ok(files)
}
