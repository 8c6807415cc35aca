//! Logical resource names

use natstage_errors::{Error, StagingError};
use std::fmt;
use std::path::{Component, Path};

/// Relative name of a bundled resource, e.g. `native/libbar.so`
///
/// Names always stay below the directory they are resolved against: absolute
/// names, `..` and `.` components, and names ending in a separator are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName(String);

impl ResourceName {
    /// Validate a caller-supplied name
    ///
    /// # Errors
    ///
    /// Returns `StagingError::InvalidName` if the name is empty, absolute,
    /// ends in a separator or contains anything but plain components.
    pub fn parse(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        let invalid = |reason: &str| -> Error {
            StagingError::InvalidName {
                name: name.clone(),
                reason: reason.to_string(),
            }
            .into()
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.ends_with('/') || name.ends_with(std::path::MAIN_SEPARATOR) {
            return Err(invalid("name refers to a directory"));
        }
        for component in Path::new(&name).components() {
            match component {
                Component::Normal(_) => {}
                Component::ParentDir => return Err(invalid("`..` is not allowed")),
                Component::CurDir => return Err(invalid("`.` is not allowed")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("name must be relative"));
                }
            }
        }
        Ok(Self(name))
    }

    /// The name as supplied, using `/` separators for archive lookups
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a relative path
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ResourceName {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl TryFrom<&str> for ResourceName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ResourceName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_nested_relative_names() {
        let name = ResourceName::parse("native/libbar.so").unwrap();
        assert_eq!(name.as_str(), "native/libbar.so");
        assert_eq!(name.as_path(), Path::new("native").join("libbar.so"));
    }

    #[test]
    fn test_rejects_escaping_names() {
        for bad in ["", "/etc/passwd", "../libfoo.so", "native/../../x", "./libfoo.so", "native/"] {
            let err = ResourceName::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::Staging(StagingError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
