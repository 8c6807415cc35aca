//! Visibility links from the working directory into a staging area

use crate::resource::ResourceName;
use crate::staging::StagingArea;
use natstage_errors::{Error, StagingError};
use natstage_events::{AppEvent, EventEmitter, StagingEvent};
use natstage_platform::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What linking did for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The target directory is the working directory; no link is needed
    SelfLink(PathBuf),
    /// A new link was created
    Linked(PathBuf),
    /// Something already occupied the link path and was left as is
    AlreadyExists(PathBuf),
}

impl LinkOutcome {
    /// Path under the working directory the resource is visible at
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::SelfLink(path) | Self::Linked(path) | Self::AlreadyExists(path) => path,
        }
    }

    /// Whether this call created the link
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Linked(_))
    }
}

/// Make `target/name` visible as `working_dir/name`
///
/// The link and any parent directories created for it are tracked by the
/// area and removed when it is dropped. An occupied link path is not an
/// error: the existing object is kept and `LinkOutcome::AlreadyExists` is
/// returned.
///
/// # Errors
///
/// Returns an error if a parent directory or the link itself cannot be
/// created for any reason other than the link path being occupied.
pub fn link_into_working_directory(
    area: &mut StagingArea,
    target: &Path,
    name: &ResourceName,
) -> Result<LinkOutcome, Error> {
    let link_path = area.working_dir.join(name.as_path());
    let final_path = target.join(name.as_path());

    if fs::same_location(&area.working_dir, target) {
        return Ok(LinkOutcome::SelfLink(link_path));
    }

    if !fs::is_occupied(&link_path) {
        if let Some(parent) = link_path.parent() {
            for dir in fs::create_dir_all_tracked(parent)? {
                area.cleanup.register(dir);
            }
        }
    }

    match fs::create_symlink(&final_path, &link_path) {
        Ok(()) => {
            area.cleanup.register(&link_path);
            area.events.emit(AppEvent::Staging(StagingEvent::LinkCreated {
                link: link_path.clone(),
                target: final_path,
            }));
            Ok(LinkOutcome::Linked(link_path))
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            area.events.emit(AppEvent::Staging(StagingEvent::LinkAlreadyExists {
                link: link_path.clone(),
            }));
            Ok(LinkOutcome::AlreadyExists(link_path))
        }
        Err(e) => Err(StagingError::from_io("create_symlink", &e, &link_path).into()),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn name(value: &str) -> ResourceName {
        ResourceName::parse(value).unwrap()
    }

    #[test]
    fn test_self_link_is_a_no_op() {
        let temp = tempdir().unwrap();
        let work = temp.path().to_path_buf();
        let mut area = StagingArea::working_dir(work.clone(), None);

        let outcome = link_into_working_directory(&mut area, &work, &name("libfoo.so")).unwrap();
        assert_eq!(outcome, LinkOutcome::SelfLink(work.join("libfoo.so")));
        assert!(!fs::is_occupied(&work.join("libfoo.so")));
        assert!(area.tracked_paths().is_empty());
    }

    #[test]
    fn test_links_nested_name_and_tracks_parent() {
        let temp = tempdir().unwrap();
        let work = temp.path().join("work");
        let stage = temp.path().join("stage");
        std::fs::create_dir_all(stage.join("native")).unwrap();
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(stage.join("native/libbar.so"), b"bar").unwrap();

        {
            let mut area = StagingArea::in_place(stage.clone(), work.clone(), None);
            let outcome =
                link_into_working_directory(&mut area, &stage, &name("native/libbar.so")).unwrap();

            assert!(outcome.is_new());
            assert_eq!(outcome.path(), work.join("native/libbar.so"));
            assert_eq!(std::fs::read(outcome.path()).unwrap(), b"bar");
            assert_eq!(
                std::fs::read_link(outcome.path()).unwrap(),
                stage.join("native/libbar.so")
            );
            assert_eq!(
                area.tracked_paths(),
                &[work.join("native"), work.join("native/libbar.so")]
            );
        }

        assert!(!work.join("native").exists());
        assert!(stage.join("native/libbar.so").exists());
    }

    #[test]
    fn test_second_link_reports_already_exists() {
        let temp = tempdir().unwrap();
        let work = temp.path().join("work");
        let stage = temp.path().join("stage");
        std::fs::create_dir_all(&stage).unwrap();
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(stage.join("libfoo.so"), b"foo").unwrap();

        let (tx, mut rx) = natstage_events::channel();
        let mut area = StagingArea::in_place(stage.clone(), work.clone(), Some(tx));
        let first = link_into_working_directory(&mut area, &stage, &name("libfoo.so")).unwrap();
        let second = link_into_working_directory(&mut area, &stage, &name("libfoo.so")).unwrap();

        assert!(first.is_new());
        assert_eq!(second, LinkOutcome::AlreadyExists(work.join("libfoo.so")));
        assert_eq!(first.path(), second.path());
        assert_eq!(area.tracked_paths().len(), 1);

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Staging(StagingEvent::LinkAlreadyExists { .. })
        )));
    }

    #[test]
    fn test_existing_regular_file_is_left_alone() {
        let temp = tempdir().unwrap();
        let work = temp.path().join("work");
        let stage = temp.path().join("stage");
        std::fs::create_dir_all(&stage).unwrap();
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(stage.join("libfoo.so"), b"staged").unwrap();
        std::fs::write(work.join("libfoo.so"), b"user copy").unwrap();

        {
            let mut area = StagingArea::in_place(stage.clone(), work.clone(), None);
            let outcome =
                link_into_working_directory(&mut area, &stage, &name("libfoo.so")).unwrap();
            assert!(matches!(outcome, LinkOutcome::AlreadyExists(_)));
        }

        assert_eq!(std::fs::read(work.join("libfoo.so")).unwrap(), b"user copy");
    }
}
