//! File event types delivered by watcher backends.

use std::path::{Path, PathBuf};

/// Represents a file system event.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEvent {
    /// Kind of file event.
    pub kind: FileEventKind,

    /// Path the event refers to. For moves this is the destination.
    pub path: PathBuf,

    /// Whether the path was a directory when the event was converted.
    pub is_dir: bool,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(kind: FileEventKind, path: PathBuf) -> Self {
        let is_dir = path.is_dir();
        Self { kind, path, is_dir }
    }

    /// Path of a file that just appeared in the watched directory, if any.
    ///
    /// Creations and moves into the directory count; modifications and
    /// removals do not.
    pub fn arrival_path(&self) -> Option<&Path> {
        if self.is_dir {
            return None;
        }
        match &self.kind {
            FileEventKind::Created => Some(&self.path),
            FileEventKind::Moved { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// Kinds of file events that can occur.
#[derive(Debug, Clone, PartialEq)]
pub enum FileEventKind {
    /// File or directory was created.
    Created,
    /// File or directory was modified.
    Modified,
    /// File or directory was deleted.
    Deleted,
    /// File or directory was moved/renamed.
    Moved {
        /// Original path before the move.
        from: PathBuf,
        /// New path after the move.
        to: PathBuf,
    },
    /// Unknown event type.
    Unknown(String),
}
