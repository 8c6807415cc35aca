//! Staging, materialization and linking error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StagingError {
    #[error("entry not found: {name} in {artifact}")]
    EntryNotFound { name: String, artifact: String },

    #[error("file already exists: {path}")]
    FileExists { path: String },

    #[error("invalid resource name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("archive error: {message}")]
    ArchiveError { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },
}

impl StagingError {
    /// Wrap an `io::Error` raised by a named filesystem operation
    ///
    /// Always a [`StagingError::FilesystemError`], including `AlreadyExists`
    /// from directory or link creation.
    #[must_use]
    pub fn from_io(operation: &str, err: &std::io::Error, path: &std::path::Path) -> Self {
        Self::FilesystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Wrap an `io::Error` from creating a resource's target file
    ///
    /// `AlreadyExists` becomes [`StagingError::FileExists`]; everything else
    /// is a `create_file` filesystem error.
    #[must_use]
    pub fn from_create_file(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::AlreadyExists => Self::FileExists {
                path: path.display().to_string(),
            },
            _ => Self::from_io("create_file", err, path),
        }
    }
}

impl UserFacingError for StagingError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EntryNotFound { .. } => {
                Some("Check that the artifact was packaged with the requested native library.")
            }
            Self::FileExists { .. } => {
                Some("Each resource name may only be staged once per staging area.")
            }
            Self::InvalidName { .. } => {
                Some("Use a relative name without `..` components, e.g. `native/libfoo.so`.")
            }
            Self::FilesystemError { .. } => {
                Some("Ensure the temp directory and working directory are writable.")
            }
            Self::ArchiveError { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::EntryNotFound { .. } => "staging.entry_not_found",
            Self::FileExists { .. } => "staging.file_exists",
            Self::InvalidName { .. } => "staging.invalid_name",
            Self::ArchiveError { .. } => "staging.archive_error",
            Self::FilesystemError { .. } => "staging.filesystem_error",
        };
        Some(code)
    }
}
