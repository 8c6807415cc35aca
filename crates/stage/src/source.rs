//! Artifact sources resources are read from
//!
//! An artifact is either a packed zip archive or an exploded directory tree.
//! Both locate entries by [`ResourceName`] and open them as byte streams, so
//! the materializer is written once against [`ArtifactSource`].

use crate::resource::ResourceName;
use natstage_errors::{Error, StagingError};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// Where a located entry lives inside its artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLocation {
    /// Regular file inside an exploded directory
    File(PathBuf),
    /// Entry index inside a zip archive
    ArchiveEntry { index: usize, size: u64 },
}

/// Capability shared by packed and exploded artifacts
pub trait ArtifactSource {
    /// Human-readable identification used in errors
    fn describe(&self) -> String;

    /// Find the entry for `name`
    ///
    /// # Errors
    ///
    /// Returns `StagingError::EntryNotFound` if the artifact has no regular
    /// file under that name.
    fn locate(&mut self, name: &ResourceName) -> Result<EntryLocation, Error>;

    /// Open a located entry for reading
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be opened.
    fn open(&mut self, location: &EntryLocation) -> Result<Box<dyn Read + '_>, Error>;

    /// Root directory when entries already exist as files on disk
    ///
    /// Exploded artifacts are linked in place instead of being copied.
    fn exploded_root(&self) -> Option<&Path> {
        None
    }

    fn not_found(&self, name: &ResourceName) -> Error {
        StagingError::EntryNotFound {
            name: name.to_string(),
            artifact: self.describe(),
        }
        .into()
    }
}

/// Zip archive opened for the duration of one batch
///
/// The file handle is released when the value is dropped.
pub struct PackedArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl PackedArchive {
    /// Open a zip archive
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a readable
    /// zip archive.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let file =
            File::open(&path).map_err(|e| StagingError::from_io("open_archive", &e, &path))?;
        let archive = ZipArchive::new(file).map_err(|e| StagingError::ArchiveError {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self { path, archive })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the archive
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}

impl std::fmt::Debug for PackedArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedArchive")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl ArtifactSource for PackedArchive {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn locate(&mut self, name: &ResourceName) -> Result<EntryLocation, Error> {
        let Some(index) = self.archive.index_for_name(name.as_str()) else {
            return Err(self.not_found(name));
        };
        let (is_dir, size) = {
            let entry = self.archive.by_index_raw(index)?;
            (entry.is_dir(), entry.size())
        };
        if is_dir {
            return Err(self.not_found(name));
        }
        Ok(EntryLocation::ArchiveEntry { index, size })
    }

    fn open(&mut self, location: &EntryLocation) -> Result<Box<dyn Read + '_>, Error> {
        let artifact = self.describe();
        match location {
            EntryLocation::ArchiveEntry { index, .. } => match self.archive.by_index(*index) {
                Ok(entry) => Ok(Box::new(entry)),
                Err(ZipError::FileNotFound) => Err(StagingError::EntryNotFound {
                    name: format!("#{index}"),
                    artifact,
                }
                .into()),
                Err(e) => Err(e.into()),
            },
            EntryLocation::File(path) => Err(StagingError::ArchiveError {
                message: format!("{} is not an entry of {artifact}", path.display()),
            }
            .into()),
        }
    }
}

/// Unpacked artifact whose resources are already regular files
#[derive(Debug, Clone)]
pub struct ExplodedDirectory {
    root: PathBuf,
}

impl ExplodedDirectory {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSource for ExplodedDirectory {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn locate(&mut self, name: &ResourceName) -> Result<EntryLocation, Error> {
        let path = self.root.join(name.as_path());
        if path.is_file() {
            Ok(EntryLocation::File(path))
        } else {
            Err(self.not_found(name))
        }
    }

    fn open(&mut self, location: &EntryLocation) -> Result<Box<dyn Read + '_>, Error> {
        match location {
            EntryLocation::File(path) => {
                let file = File::open(path)
                    .map_err(|e| StagingError::from_io("open_entry", &e, path))?;
                Ok(Box::new(file))
            }
            EntryLocation::ArchiveEntry { index, .. } => Err(StagingError::ArchiveError {
                message: format!("archive entry #{index} requested from {}", self.describe()),
            }
            .into()),
        }
    }

    fn exploded_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// An artifact whose kind was detected from the filesystem
#[derive(Debug)]
pub enum Artifact {
    PackedArchive(PackedArchive),
    ExplodedDirectory(ExplodedDirectory),
}

impl Artifact {
    /// Open `path` as an exploded directory or, otherwise, a zip archive
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is neither a directory nor a readable zip
    /// archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(Self::ExplodedDirectory(ExplodedDirectory::new(path)))
        } else {
            PackedArchive::open(path).map(Self::PackedArchive)
        }
    }

    fn source_mut(&mut self) -> &mut dyn ArtifactSource {
        match self {
            Self::PackedArchive(archive) => archive,
            Self::ExplodedDirectory(dir) => dir,
        }
    }

    fn source(&self) -> &dyn ArtifactSource {
        match self {
            Self::PackedArchive(archive) => archive,
            Self::ExplodedDirectory(dir) => dir,
        }
    }
}

impl ArtifactSource for Artifact {
    fn describe(&self) -> String {
        self.source().describe()
    }

    fn locate(&mut self, name: &ResourceName) -> Result<EntryLocation, Error> {
        self.source_mut().locate(name)
    }

    fn open(&mut self, location: &EntryLocation) -> Result<Box<dyn Read + '_>, Error> {
        self.source_mut().open(location)
    }

    fn exploded_root(&self) -> Option<&Path> {
        self.source().exploded_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        writer
            .add_directory("native/", SimpleFileOptions::default())
            .unwrap();
        for (name, bytes) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    fn name(value: &str) -> ResourceName {
        ResourceName::parse(value).unwrap()
    }

    #[test]
    fn test_packed_archive_locate_and_open() {
        let temp = tempdir().unwrap();
        let zip_path = temp.path().join("app.zip");
        write_zip(&zip_path, &[("native/libbar.so", b"bar bytes")]);

        let mut archive = PackedArchive::open(&zip_path).unwrap();
        let location = archive.locate(&name("native/libbar.so")).unwrap();
        assert!(matches!(location, EntryLocation::ArchiveEntry { size: 9, .. }));

        let mut content = Vec::new();
        archive
            .open(&location)
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"bar bytes");
    }

    #[test]
    fn test_packed_archive_missing_and_directory_entries() {
        let temp = tempdir().unwrap();
        let zip_path = temp.path().join("app.zip");
        write_zip(&zip_path, &[("libfoo.so", b"foo")]);

        let mut archive = PackedArchive::open(&zip_path).unwrap();
        for missing in ["libmissing.so", "native"] {
            let err = archive.locate(&name(missing)).unwrap_err();
            assert!(matches!(
                err,
                Error::Staging(StagingError::EntryNotFound { .. })
            ));
        }
    }

    #[test]
    fn test_exploded_directory_locates_files_only() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("native")).unwrap();
        std::fs::write(temp.path().join("native/libbar.so"), b"bar").unwrap();

        let mut dir = ExplodedDirectory::new(temp.path());
        let location = dir.locate(&name("native/libbar.so")).unwrap();
        assert_eq!(
            location,
            EntryLocation::File(temp.path().join("native/libbar.so"))
        );
        assert!(dir.locate(&name("native")).is_err());
        assert_eq!(dir.exploded_root(), Some(temp.path()));
    }

    #[test]
    fn test_artifact_detection() {
        let temp = tempdir().unwrap();
        let zip_path = temp.path().join("app.zip");
        write_zip(&zip_path, &[("libfoo.so", b"foo")]);

        assert!(matches!(
            Artifact::open(temp.path()).unwrap(),
            Artifact::ExplodedDirectory(_)
        ));
        let packed = Artifact::open(&zip_path).unwrap();
        assert!(matches!(packed, Artifact::PackedArchive(_)));
        assert!(packed.exploded_root().is_none());

        let not_zip = temp.path().join("plain.txt");
        std::fs::write(&not_zip, b"not an archive").unwrap();
        assert!(matches!(
            Artifact::open(&not_zip).unwrap_err(),
            Error::Staging(StagingError::ArchiveError { .. })
        ));
    }
}
