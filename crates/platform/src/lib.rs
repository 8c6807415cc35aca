#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform abstraction layer for natstage.
//!
//! This crate isolates the operations whose behavior differs between
//! operating systems:
//! - Filesystem operations (symbolic links, tracked directory creation,
//!   non-recursive removal)
//! - Native loader conventions (search-path variable, path separator)

pub mod fs;
pub mod loader;

pub use loader::{native_search_path_key, path_separator, wants_current_dir_in_search_path};
