//! Copying resource bytes into a staging area

use crate::linking::{link_into_working_directory, LinkOutcome};
use crate::resource::ResourceName;
use crate::source::ArtifactSource;
use crate::staging::StagingArea;
use natstage_errors::{Error, StagingError};
use natstage_events::{AppEvent, EventEmitter, StagingEvent};
use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::PathBuf;

/// One resource after staging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedResource {
    pub name: ResourceName,
    /// Regular file holding the bytes
    pub path: PathBuf,
    /// Bytes copied; `None` when an exploded artifact was linked in place
    pub bytes: Option<u64>,
    pub link: LinkOutcome,
}

/// Copy `source` to `area/name` and link it into the working directory
///
/// Parent directories are created as needed. The target must not exist yet.
///
/// # Errors
///
/// Returns `StagingError::FileExists` if the target already exists, and a
/// filesystem error if a directory, the file, or the link cannot be created
/// or the source cannot be read to the end.
pub fn materialize<R: Read + ?Sized>(
    area: &mut StagingArea,
    name: &ResourceName,
    source: &mut R,
) -> Result<StagedResource, Error> {
    let area_path = area.path().to_path_buf();
    let target = area_path.join(name.as_path());

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StagingError::from_io("create_dir", &e, parent))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .map_err(|e| StagingError::from_create_file(&e, &target))?;
    let bytes =
        io::copy(source, &mut file).map_err(|e| StagingError::from_io("copy", &e, &target))?;
    drop(file);

    area.events
        .emit(AppEvent::Staging(StagingEvent::ResourceMaterialized {
            name: name.to_string(),
            path: target.clone(),
            bytes,
        }));

    let link = link_into_working_directory(area, &area_path, name)?;
    Ok(StagedResource {
        name: name.clone(),
        path: target,
        bytes: Some(bytes),
        link,
    })
}

/// Stage every name from `artifact`, in order
///
/// Exploded artifacts are not copied: each name is checked to exist under the
/// artifact root and linked from the working directory straight into it.
/// Packed artifacts are streamed entry by entry into `area`. The first failure
/// aborts the batch; resources staged before it stay tracked by `area`.
///
/// # Errors
///
/// Returns `StagingError::EntryNotFound` for a name the artifact does not
/// contain, or any error from [`materialize`] or linking.
pub fn materialize_all<A: ArtifactSource + ?Sized>(
    artifact: &mut A,
    area: &mut StagingArea,
    names: &[ResourceName],
) -> Result<Vec<StagedResource>, Error> {
    let mut staged = Vec::with_capacity(names.len());

    if let Some(root) = artifact.exploded_root().map(std::path::Path::to_path_buf) {
        for name in names {
            artifact.locate(name)?;
            let link = link_into_working_directory(area, &root, name)?;
            staged.push(StagedResource {
                name: name.clone(),
                path: root.join(name.as_path()),
                bytes: None,
                link,
            });
        }
        return Ok(staged);
    }

    for name in names {
        let location = artifact.locate(name)?;
        let mut reader = artifact.open(&location)?;
        staged.push(materialize(area, name, &mut reader)?);
    }
    Ok(staged)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::source::{ExplodedDirectory, PackedArchive};
    use proptest::prelude::*;
    use std::io::{Cursor, Write};
    use std::path::Path;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn name(value: &str) -> ResourceName {
        ResourceName::parse(value).unwrap()
    }

    fn ephemeral_area(root: &Path) -> StagingArea {
        let work = root.join("work");
        std::fs::create_dir_all(&work).unwrap();
        StagingArea::ephemeral(&root.join("tmp"), "natstage-", work, None).unwrap()
    }

    #[test]
    fn test_materialize_copies_and_links() {
        let temp = tempdir().unwrap();
        let mut area = ephemeral_area(temp.path());

        let staged = materialize(
            &mut area,
            &name("native/libbar.so"),
            &mut Cursor::new(b"bar".to_vec()),
        )
        .unwrap();

        assert_eq!(staged.path, area.path().join("native/libbar.so"));
        assert_eq!(staged.bytes, Some(3));
        assert!(staged.link.is_new());
        assert_eq!(std::fs::read(&staged.path).unwrap(), b"bar");
        assert_eq!(std::fs::read(staged.link.path()).unwrap(), b"bar");
    }

    #[test]
    fn test_materialize_refuses_existing_target() {
        let temp = tempdir().unwrap();
        let mut area = ephemeral_area(temp.path());
        let lib = name("libfoo.so");

        materialize(&mut area, &lib, &mut Cursor::new(b"one".to_vec())).unwrap();
        let err = materialize(&mut area, &lib, &mut Cursor::new(b"two".to_vec())).unwrap_err();

        assert!(matches!(err, Error::Staging(StagingError::FileExists { .. })));
        assert_eq!(std::fs::read(area.path().join("libfoo.so")).unwrap(), b"one");
    }

    #[test]
    fn test_unreadable_source_is_an_io_failure() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("stream closed"))
            }
        }

        let temp = tempdir().unwrap();
        let mut area = ephemeral_area(temp.path());
        let err = materialize(&mut area, &name("libfoo.so"), &mut Broken).unwrap_err();
        assert!(matches!(
            err,
            Error::Staging(StagingError::FilesystemError { .. })
        ));
    }

    #[test]
    fn test_materialize_all_from_archive() {
        let temp = tempdir().unwrap();
        let zip_path = temp.path().join("app.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
        for (entry, bytes) in [("libfoo.so", &b"foo"[..]), ("native/libbar.so", &b"bar"[..])] {
            writer.start_file(entry, SimpleFileOptions::default()).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();

        let mut area = ephemeral_area(temp.path());
        let mut archive = PackedArchive::open(&zip_path).unwrap();
        let staged = materialize_all(
            &mut archive,
            &mut area,
            &[name("libfoo.so"), name("native/libbar.so")],
        )
        .unwrap();

        assert_eq!(staged.len(), 2);
        let work = temp.path().join("work");
        assert_eq!(std::fs::read(work.join("libfoo.so")).unwrap(), b"foo");
        assert_eq!(std::fs::read(work.join("native/libbar.so")).unwrap(), b"bar");
    }

    #[test]
    fn test_materialize_all_stops_at_missing_entry() {
        let temp = tempdir().unwrap();
        let zip_path = temp.path().join("app.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
        writer.start_file("libfoo.so", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"foo").unwrap();
        writer.finish().unwrap();

        let mut area = ephemeral_area(temp.path());
        let mut archive = PackedArchive::open(&zip_path).unwrap();
        let err = materialize_all(
            &mut archive,
            &mut area,
            &[name("libfoo.so"), name("libmissing.so")],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Staging(StagingError::EntryNotFound { .. })
        ));
        let work = temp.path().join("work");
        assert!(natstage_platform::fs::is_occupied(&work.join("libfoo.so")));
        assert!(!natstage_platform::fs::is_occupied(&work.join("libmissing.so")));
    }

    #[test]
    fn test_exploded_directory_is_linked_not_copied() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("exploded");
        std::fs::create_dir_all(root.join("native")).unwrap();
        std::fs::write(root.join("native/libbar.so"), b"bar").unwrap();

        let mut area = ephemeral_area(temp.path());
        let mut dir = ExplodedDirectory::new(&root);
        let staged = materialize_all(&mut dir, &mut area, &[name("native/libbar.so")]).unwrap();

        assert_eq!(staged[0].bytes, None);
        assert_eq!(staged[0].path, root.join("native/libbar.so"));
        assert_eq!(std::fs::read_dir(area.path()).unwrap().count(), 0);
        let link = temp.path().join("work/native/libbar.so");
        assert_eq!(std::fs::read_link(&link).unwrap(), root.join("native/libbar.so"));
    }

    proptest! {
        #[test]
        fn prop_materialized_bytes_round_trip(
            content in proptest::collection::vec(any::<u8>(), 0..4096),
            file in "[a-z]{1,12}\\.so",
        ) {
            let temp = tempdir().unwrap();
            let mut area = ephemeral_area(temp.path());
            let lib = name(&file);

            let staged = materialize(&mut area, &lib, &mut Cursor::new(content.clone())).unwrap();
            prop_assert_eq!(std::fs::read(area.path().join(&file)).unwrap(), content.clone());
            prop_assert_eq!(std::fs::read(staged.link.path()).unwrap(), content);
        }
    }
}
