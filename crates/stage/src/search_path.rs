//! Loader search-path values
//!
//! The registrar is pure: it turns an old value and a new segment into a new
//! value. Persisting the result (process environment, a child's environment,
//! a loader configuration) is the caller's decision; see
//! [`LoaderSearchPath::export`].

use natstage_events::{AppEvent, StagingEvent};
use std::path::Path;

const CURRENT_DIR: &str = ".";

/// Prepend `segment` to `previous`
///
/// An absent or empty previous value yields just `segment`; trailing
/// separators are trimmed.
#[must_use]
pub fn append_search_path(previous: Option<&str>, segment: &str, separator: char) -> String {
    let mut value = String::from(segment);
    value.push(separator);
    if let Some(previous) = previous.filter(|p| !p.is_empty()) {
        value.push_str(previous);
    }
    value.trim_end_matches(separator).to_string()
}

/// Prepend `.` unless it is already one of the segments
///
/// Returns `None` when `previous` already contains `.`.
#[must_use]
pub fn prepend_current_dir(previous: Option<&str>, separator: char) -> Option<String> {
    let present = previous.is_some_and(|p| p.split(separator).any(|s| s == CURRENT_DIR));
    if present {
        None
    } else {
        Some(append_search_path(previous, CURRENT_DIR, separator))
    }
}

/// Explicit loader search-path value handed to whatever loads native code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSearchPath {
    key: String,
    separator: char,
    value: Option<String>,
}

impl LoaderSearchPath {
    #[must_use]
    pub fn new(key: impl Into<String>, separator: char, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            separator,
            value,
        }
    }

    /// Snapshot `key` from the process environment with the platform separator
    ///
    /// A missing or non-UTF-8 variable is treated as absent.
    #[must_use]
    pub fn from_env(key: impl Into<String>) -> Self {
        let key = key.into();
        let value = std::env::var(&key).ok();
        Self::new(key, natstage_platform::path_separator(), value)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Non-empty segments in search order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.value
            .as_deref()
            .unwrap_or_default()
            .split(self.separator)
            .filter(|s| !s.is_empty())
    }

    /// Put `segment` in front of the current value
    pub fn append(&mut self, segment: &str) {
        self.value = Some(append_search_path(
            self.value.as_deref(),
            segment,
            self.separator,
        ));
    }

    /// Put a directory in front of the current value
    pub fn append_dir(&mut self, dir: &Path) {
        self.append(&dir.to_string_lossy());
    }

    /// Make sure `.` is searched; returns whether the value changed
    pub fn ensure_current_dir(&mut self) -> bool {
        match prepend_current_dir(self.value.as_deref(), self.separator) {
            Some(value) => {
                self.value = Some(value);
                true
            }
            None => false,
        }
    }

    /// Write the value into the process environment
    ///
    /// This is a plain read-modify-write of process-wide state with no
    /// locking; concurrent exports race and the last writer wins. Loaders
    /// that read the variable only at process start see the change in child
    /// processes only.
    pub fn export(&self) {
        if let Some(value) = &self.value {
            std::env::set_var(&self.key, value);
        }
    }

    /// Event describing the current value
    #[must_use]
    pub fn to_event(&self) -> AppEvent {
        AppEvent::Staging(StagingEvent::SearchPathUpdated {
            key: self.key.clone(),
            value: self.value.clone().unwrap_or_default(),
        })
    }
}
