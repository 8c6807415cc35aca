#![warn(clippy::pedantic)]
#![deny(clippy::all)]
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Staging of bundled native libraries for natstage
//!
//! Libraries shipped inside a zip artifact (or an exploded copy of one) are
//! written to a staging directory, symlinked into the working directory under
//! the same relative names, and the staging directory is made known to the
//! dynamic loader search path. Everything created on disk is owned by the
//! returned [`PreparedLibraries`] and removed when it is dropped, unless it is
//! explicitly persisted.
//!
//! ```no_run
//! use natstage::{Config, Preparer};
//!
//! # fn main() -> Result<(), natstage::Error> {
//! let preparer = Preparer::new(Config::default());
//! let prepared = preparer.make_available_from_artifact("app.jar", &["libfoo.so"])?;
//! println!("staged under {}", prepared.path().display());
//! # Ok(())
//! # }
//! ```

mod cleanup;
mod linking;
mod materialize;
mod preparer;
mod resource;
mod search_path;
mod source;
mod staging;

pub use cleanup::CleanupRegistry;
pub use linking::{link_into_working_directory, LinkOutcome};
pub use materialize::{materialize, materialize_all, StagedResource};
pub use preparer::{PreparedLibraries, Preparer};
pub use resource::ResourceName;
pub use search_path::{append_search_path, prepend_current_dir, LoaderSearchPath};
pub use source::{Artifact, ArtifactSource, EntryLocation, ExplodedDirectory, PackedArchive};
pub use staging::{resolve_staging_area, AreaKind, StagingArea};

pub use natstage_config::Config;
pub use natstage_errors::{ConfigError, Error, StagingError, UserFacingError};
pub use natstage_events::{AppEvent, EventSender, StagingEvent};

use std::io::Read;

/// Stage `entries` using the default configuration plus environment overrides
///
/// The returned [`PreparedLibraries`] decides how long the files stay on
/// disk: they are removed when it is dropped, so keep it alive while the
/// libraries are in use or call [`PreparedLibraries::persist`].
///
/// # Errors
///
/// Returns an error if the environment configuration is invalid or any
/// resource cannot be staged.
#[must_use = "dropping PreparedLibraries removes the staged files"]
pub fn make_available<I, N, R>(entries: I) -> Result<PreparedLibraries, Error>
where
    I: IntoIterator<Item = (N, R)>,
    N: AsRef<str>,
    R: Read,
{
    Preparer::from_env()?.make_available(entries)
}
