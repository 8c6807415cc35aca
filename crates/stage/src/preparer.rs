//! Batch entry points
//!
//! [`Preparer`] ties the pieces together: resolve a staging area, stage every
//! requested resource, optionally build the loader search path, and hand back
//! a [`PreparedLibraries`] guard that owns everything created on disk.

use crate::materialize::{materialize, materialize_all, StagedResource};
use crate::resource::ResourceName;
use crate::search_path::LoaderSearchPath;
use crate::source::{Artifact, ArtifactSource};
use crate::staging::{resolve_staging_area, StagingArea};
use natstage_config::Config;
use natstage_errors::{Error, StagingError};
use natstage_events::{EventEmitter, EventSender, FailureContext};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Stages native resources according to a [`Config`]
#[derive(Debug, Clone, Default)]
pub struct Preparer {
    config: Config,
    events: Option<EventSender>,
}

impl EventEmitter for Preparer {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl Preparer {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Defaults merged with `NATSTAGE_*` environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an environment override holds an invalid value.
    pub fn from_env() -> Result<Self, Error> {
        Config::from_env().map(Self::new)
    }

    /// Report progress over `sender` in addition to `tracing`
    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stage caller-supplied byte streams
    ///
    /// Accepts any `(name, stream)` sequence: a `HashMap`/`BTreeMap` of
    /// streams or an ordered `Vec` of pairs. A name repeated in a sequence
    /// fails with `StagingError::FileExists`.
    ///
    /// # Errors
    ///
    /// Returns the first naming, staging or linking error; everything staged
    /// up to that point is removed again.
    #[must_use = "dropping PreparedLibraries removes the staged files"]
    pub fn make_available<I, N, R>(&self, entries: I) -> Result<PreparedLibraries, Error>
    where
        I: IntoIterator<Item = (N, R)>,
        N: AsRef<str>,
        R: Read,
    {
        self.run("make_available", || {
            let mut area = resolve_staging_area(
                self.config.staging.ephemeral,
                &self.config,
                self.events.clone(),
            )?;
            let mut resources = Vec::new();
            for (name, mut reader) in entries {
                let name = ResourceName::parse(name.as_ref())?;
                resources.push(materialize(&mut area, &name, &mut reader)?);
            }
            Ok(self.finish(area, resources))
        })
    }

    /// Stage `names` out of a zip archive or an exploded directory
    ///
    /// A directory artifact is linked in place and becomes the returned path;
    /// nothing is copied. An archive is streamed into a fresh staging area
    /// and closed before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be opened, a name is invalid
    /// or missing, or staging/linking fails.
    #[must_use = "dropping PreparedLibraries removes the staged files"]
    pub fn make_available_from_artifact<N: AsRef<str>>(
        &self,
        artifact: impl AsRef<Path>,
        names: &[N],
    ) -> Result<PreparedLibraries, Error> {
        self.run("make_available_from_artifact", || {
            let names = names
                .iter()
                .map(|name| ResourceName::parse(name.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;

            let artifact_path = artifact.as_ref();
            let artifact_path = std::path::absolute(artifact_path)
                .map_err(|e| StagingError::from_io("resolve_artifact", &e, artifact_path))?;
            let mut artifact = Artifact::open(&artifact_path)?;

            let mut area = match artifact.exploded_root() {
                Some(root) => StagingArea::in_place(
                    root.to_path_buf(),
                    self.config.working_dir()?,
                    self.events.clone(),
                ),
                None => resolve_staging_area(
                    self.config.staging.ephemeral,
                    &self.config,
                    self.events.clone(),
                )?,
            };

            let resources = materialize_all(&mut artifact, &mut area, &names)?;
            drop(artifact);
            Ok(self.finish(area, resources))
        })
    }

    fn finish(&self, area: StagingArea, resources: Vec<StagedResource>) -> PreparedLibraries {
        let loader = &self.config.loader;
        let search_path = loader.register.then(|| {
            let mut search_path = LoaderSearchPath::from_env(self.config.search_path_key());
            search_path.append_dir(area.path());
            if loader.prepend_current_dir {
                search_path.ensure_current_dir();
            }
            if loader.export_env {
                search_path.export();
            }
            self.emit(search_path.to_event());
            search_path
        });

        PreparedLibraries {
            area,
            resources,
            search_path,
        }
    }

    fn run<T>(&self, operation: &str, f: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
        self.emit_operation_started(operation);
        match f() {
            Ok(value) => {
                self.emit_operation_completed(operation, true);
                Ok(value)
            }
            Err(e) => {
                self.emit_operation_failed(operation, FailureContext::from_error(&e));
                Err(e)
            }
        }
    }
}

/// Staged libraries; dropping this removes everything created on disk
#[derive(Debug)]
#[must_use = "dropping PreparedLibraries removes the staged files; bind it or call persist()"]
pub struct PreparedLibraries {
    area: StagingArea,
    resources: Vec<StagedResource>,
    search_path: Option<LoaderSearchPath>,
}

impl PreparedLibraries {
    /// Absolute directory to hand to the native loader
    #[must_use]
    pub fn path(&self) -> &Path {
        self.area.path()
    }

    #[must_use]
    pub fn area(&self) -> &StagingArea {
        &self.area
    }

    /// Staged resources in request order
    #[must_use]
    pub fn resources(&self) -> &[StagedResource] {
        &self.resources
    }

    /// Loader search path built for this staging area, when registration is on
    #[must_use]
    pub fn search_path(&self) -> Option<&LoaderSearchPath> {
        self.search_path.as_ref()
    }

    /// Keep files and links on disk after this value is dropped
    pub fn persist(self) -> PathBuf {
        self.area.persist()
    }
}
