//! Staging area resolution
//!
//! A staging area is the directory resolved resources are copied into. It is
//! either a fresh temp directory owned by this process, the working directory
//! itself, or (for exploded artifacts) the artifact root used in place.
//! Dropping the area removes everything this run created: links in the
//! working directory first, then the temp directory recursively.

use crate::cleanup::CleanupRegistry;
use natstage_config::Config;
use natstage_errors::{Error, StagingError};
use natstage_events::{AppEvent, EventEmitter, EventSender, StagingEvent};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// How the staging directory came to be, which decides what drop removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    /// Fresh temp directory, removed recursively on drop
    Ephemeral,
    /// The working directory; never removed
    WorkingDir,
    /// An existing directory used where it is; never removed
    InPlace,
}

/// Scoped staging directory plus the cleanup of what was linked from it
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    pub(crate) working_dir: PathBuf,
    kind: AreaKind,
    pub(crate) cleanup: CleanupRegistry,
    temp: Option<TempDir>,
    pub(crate) events: Option<EventSender>,
}

/// Pick or create the staging area
///
/// With `ephemeral == false` this is the configured working directory and
/// nothing is touched on disk.
///
/// # Errors
///
/// Returns an error if `config` fails validation, the working directory
/// cannot be determined, or the temp directory cannot be created.
pub fn resolve_staging_area(
    ephemeral: bool,
    config: &Config,
    events: Option<EventSender>,
) -> Result<StagingArea, Error> {
    config.validate()?;
    let working_dir = config.working_dir()?;
    if ephemeral {
        StagingArea::ephemeral(
            &config.temp_root(),
            &config.staging.temp_prefix,
            working_dir,
            events,
        )
    } else {
        Ok(StagingArea::working_dir(working_dir, events))
    }
}

impl StagingArea {
    /// Create a uniquely named temp directory under `temp_root`
    ///
    /// # Errors
    ///
    /// Returns an error if `temp_root` cannot be created or the temp
    /// directory cannot be created inside it.
    pub fn ephemeral(
        temp_root: &Path,
        prefix: &str,
        working_dir: PathBuf,
        events: Option<EventSender>,
    ) -> Result<Self, Error> {
        std::fs::create_dir_all(temp_root)
            .map_err(|e| StagingError::from_io("create_temp_root", &e, temp_root))?;

        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(temp_root)
            .map_err(|e| StagingError::from_io("create_temp_dir", &e, temp_root))?;
        let path = std::path::absolute(temp.path())
            .map_err(|e| StagingError::from_io("resolve_temp_dir", &e, temp.path()))?;

        Ok(Self::with_kind(
            path,
            working_dir,
            AreaKind::Ephemeral,
            Some(temp),
            events,
        ))
    }

    /// Use the working directory itself as the staging area
    #[must_use]
    pub fn working_dir(working_dir: PathBuf, events: Option<EventSender>) -> Self {
        Self::with_kind(
            working_dir.clone(),
            working_dir,
            AreaKind::WorkingDir,
            None,
            events,
        )
    }

    /// Use an existing directory where it is
    #[must_use]
    pub fn in_place(root: PathBuf, working_dir: PathBuf, events: Option<EventSender>) -> Self {
        Self::with_kind(root, working_dir, AreaKind::InPlace, None, events)
    }

    fn with_kind(
        path: PathBuf,
        working_dir: PathBuf,
        kind: AreaKind,
        temp: Option<TempDir>,
        events: Option<EventSender>,
    ) -> Self {
        events.emit(AppEvent::Staging(StagingEvent::AreaCreated {
            path: path.clone(),
            ephemeral: kind == AreaKind::Ephemeral,
        }));
        Self {
            path,
            working_dir,
            kind,
            cleanup: CleanupRegistry::new(events.clone()),
            temp,
            events,
        }
    }

    /// Absolute path of the staging directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory visibility links are created in
    #[must_use]
    pub fn working_dir_path(&self) -> &Path {
        &self.working_dir
    }

    #[must_use]
    pub fn kind(&self) -> AreaKind {
        self.kind
    }

    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.kind == AreaKind::Ephemeral
    }

    /// Paths outside the staging directory that drop will remove
    #[must_use]
    pub fn tracked_paths(&self) -> &[PathBuf] {
        self.cleanup.entries()
    }

    /// Keep the staging directory and every link past drop
    ///
    /// Returns the staging directory path.
    pub fn persist(mut self) -> PathBuf {
        self.cleanup.disarm();
        if let Some(temp) = self.temp.take() {
            let kept = temp.keep();
            tracing::debug!(path = %kept.display(), "staging directory persisted");
        }
        self.path.clone()
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        let failures = self.cleanup.run();
        if failures > 0 {
            self.events.emit_warning_with_context(
                format!("staging cleanup left {failures} entries behind"),
                self.path.display().to_string(),
            );
        }

        if let Some(temp) = self.temp.take() {
            let path = temp.path().to_path_buf();
            match temp.close() {
                Ok(()) => self
                    .events
                    .emit(AppEvent::Staging(StagingEvent::CleanedUp { path })),
                Err(e) => self.events.emit(AppEvent::Staging(StagingEvent::CleanupFailed {
                    path,
                    error: e.to_string(),
                })),
            }
        }
    }
}
