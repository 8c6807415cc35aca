//! Staging, linking and loader search-path events

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StagingEvent {
    /// A staging area was resolved
    AreaCreated {
        path: PathBuf,
        /// `true` for a fresh temp directory, `false` for the working directory
        ephemeral: bool,
    },

    /// Resource bytes were copied into the staging area
    ResourceMaterialized {
        name: String,
        path: PathBuf,
        bytes: u64,
    },

    /// A visibility link was created in the working directory
    LinkCreated { link: PathBuf, target: PathBuf },

    /// Something already occupied the link path; it was left untouched
    LinkAlreadyExists { link: PathBuf },

    /// A loader search-path value was rebuilt
    SearchPathUpdated { key: String, value: String },

    /// A tracked path was removed during cleanup
    CleanedUp { path: PathBuf },

    /// A tracked path could not be removed during cleanup
    CleanupFailed { path: PathBuf, error: String },
}
