//! Scoped removal of paths created outside the staging area

use natstage_events::{AppEvent, EventEmitter, EventSender, StagingEvent};
use std::io;
use std::path::{Path, PathBuf};

/// Paths to remove when the owning staging operation ends
///
/// Entries are removed in reverse registration order, so a link is removed
/// before the directory that was created to hold it. Removal never recurses:
/// a directory that still has content (something this run did not create)
/// is left in place and the failure is reported as a debug event.
#[derive(Debug)]
pub struct CleanupRegistry {
    entries: Vec<PathBuf>,
    events: Option<EventSender>,
    armed: bool,
}

impl CleanupRegistry {
    #[must_use]
    pub fn new(events: Option<EventSender>) -> Self {
        Self {
            entries: Vec::new(),
            events,
            armed: true,
        }
    }

    /// Track a path for removal
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(path.into());
    }

    /// Paths currently tracked, in registration order
    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Stop tracking everything; nothing is removed on drop
    pub fn disarm(&mut self) -> Vec<PathBuf> {
        self.armed = false;
        std::mem::take(&mut self.entries)
    }

    /// Remove every tracked path now
    ///
    /// Returns the number of paths that could not be removed.
    pub fn run(&mut self) -> usize {
        let mut failed = 0;
        while let Some(path) = self.entries.pop() {
            if !self.remove_one(&path) {
                failed += 1;
            }
        }
        failed
    }

    fn remove_one(&self, path: &Path) -> bool {
        match natstage_platform::fs::remove_tracked(path) {
            Ok(()) => {
                self.events.emit(AppEvent::Staging(StagingEvent::CleanedUp {
                    path: path.to_path_buf(),
                }));
                true
            }
            // Removed by someone else already
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                self.events.emit(AppEvent::Staging(StagingEvent::CleanupFailed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }));
                false
            }
        }
    }
}

impl Drop for CleanupRegistry {
    fn drop(&mut self) {
        if self.armed {
            self.run();
        }
    }
}
