//! Native dynamic-loader conventions per platform

/// Environment variable consulted by the dynamic loader on this platform
#[must_use]
pub fn native_search_path_key() -> &'static str {
    if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else if cfg!(windows) {
        "PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

/// Separator between search-path segments
#[must_use]
pub fn path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}

/// Whether `.` must be on the loader search path for links in the working
/// directory to resolve
///
/// Only Linux needs this: its loader does not treat the directory holding a
/// relative link as searched unless the working directory is on the path.
#[must_use]
pub fn wants_current_dir_in_search_path() -> bool {
    cfg!(target_os = "linux")
}
