//! Filesystem helpers used by staging and linking.
//!
//! These functions return `natstage_errors::Error` except where the caller
//! needs to inspect the raw `io::ErrorKind` (symlink creation, removal).

use natstage_errors::{ConfigError, Error, StagingError};
use std::io;
use std::path::{Path, PathBuf};

/// Result type for filesystem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Resolve the process working directory
///
/// # Errors
///
/// Returns an error if the working directory has been removed or is not
/// accessible.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| {
        ConfigError::WorkingDirUnavailable {
            message: e.to_string(),
        }
        .into()
    })
}

/// Create a directory and all missing parents, returning the directories that
/// did not exist before, outermost first
///
/// A directory appearing concurrently between the check and the creation is
/// treated as pre-existing and is not reported.
///
/// # Errors
///
/// Returns an error if any missing directory cannot be created.
pub fn create_dir_all_tracked(path: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() || ancestor.is_dir() {
            break;
        }
        missing.push(ancestor.to_path_buf());
    }
    missing.reverse();

    let mut created = Vec::with_capacity(missing.len());
    for dir in missing {
        match std::fs::create_dir(&dir) {
            Ok(()) => created.push(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => return Err(StagingError::from_io("create_dir", &e, &dir).into()),
        }
    }
    Ok(created)
}

/// Create a symbolic link at `link` pointing to `target`
///
/// The raw `io::Error` is returned so callers can tell "already exists" apart
/// from real failures.
///
/// # Errors
///
/// Returns the underlying I/O error from the platform call.
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Create a symbolic link at `link` pointing to `target`
///
/// Windows distinguishes file and directory links; the kind is taken from the
/// target as it exists now.
///
/// # Errors
///
/// Returns the underlying I/O error from the platform call.
#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Whether any filesystem object occupies `path`, including a dangling link
#[must_use]
pub fn is_occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Remove a single tracked path without recursing
///
/// Links and files are unlinked; directories are only removed when empty.
///
/// # Errors
///
/// Returns the underlying I/O error, e.g. `DirectoryNotEmpty`.
pub fn remove_tracked(path: &Path) -> io::Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Whether two paths name the same directory
///
/// Compares literally first, then by canonical form so that `/tmp` and its
/// resolved location (e.g. `/private/tmp` on macOS) are recognised as equal.
#[must_use]
pub fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
