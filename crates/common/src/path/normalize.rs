// Folder path normalization: `~` expansion, absolutization, lexical cleanup.
//
// Registered folders are keyed by their absolute path, so every entry point
// (CLI arguments, the current directory, config file keys) must funnel through
// the same normalization to make lookups agree.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path contains null byte")]
    NullByte,

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("could not determine current directory: {0}")]
    CurrentDir(String),

    #[error("path is not valid UTF-8: {0}")]
    NotUtf8(String),
}

/// Normalize a user-supplied folder path into the absolute form used as the
/// registry key.
///
/// Rules:
/// - Expand a leading `~` to the home directory
/// - Resolve relative paths against the current directory
/// - Drop `.` components and fold `..` into the parent
/// - Strip trailing separators
///
/// Symlinks are not resolved; `/a/link` and its target are different folders.
pub fn normalize_folder(input: &str) -> Result<PathBuf, PathError> {
    let cwd = std::env::current_dir().map_err(|e| PathError::CurrentDir(e.to_string()))?;
    normalize_folder_from(input, &cwd, dirs::home_dir().as_deref())
}

/// Testable variant with explicit current and home directories.
pub fn normalize_folder_from(
    input: &str,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<PathBuf, PathError> {
    if input.trim().is_empty() {
        return Err(PathError::Empty);
    }
    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let expanded = if input == "~" {
        home.ok_or(PathError::NoHomeDir)?.to_path_buf()
    } else if let Some(rest) = input.strip_prefix("~/") {
        home.ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(input)
    };

    let absolute = if expanded.is_absolute() { expanded } else { cwd.join(expanded) };
    Ok(clean(&absolute))
}

/// String form of a normalized folder, as stored in the config file.
pub fn folder_key(path: &Path) -> Result<String, PathError> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| PathError::NotUtf8(path.display().to_string()))
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
