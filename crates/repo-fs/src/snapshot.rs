//! Directory snapshots for change detection
//!
//! A snapshot maps every regular file under a root to its last-modified
//! time. Symlinks to files are included with the target's time. Two snapshots are equal iff they hold the same paths with the same
//! timestamps. Snapshots are never persisted.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::{Error, Result};

/// Path to modification-time mapping for a directory tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: BTreeMap<PathBuf, SystemTime>,
}

impl DirectorySnapshot {
    /// Walk `root` and record every file's modification time.
    ///
    /// Files that vanish between listing and `stat` are left out of the
    /// snapshot. Only a missing or unreadable root is an error.
    pub fn capture(root: &Path) -> Result<Self> {
        let meta = std::fs::metadata(root).map_err(|e| Error::io(root, e))?;
        if !meta.is_dir() {
            return Err(Error::io(
                root,
                std::io::Error::new(ErrorKind::NotADirectory, "snapshot root is not a directory"),
            ));
        }

        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if e.io_error().map(|io| io.kind()) != Some(ErrorKind::NotFound) {
                        tracing::debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                    }
                    continue;
                }
            };

            // Symlinked files count with their target's time; symlinked
            // directories are not descended into.
            let file_type = entry.file_type();
            let metadata = if file_type.is_file() {
                entry.metadata().map_err(std::io::Error::from)
            } else if file_type.is_symlink() {
                std::fs::metadata(entry.path())
            } else {
                continue;
            };

            match metadata.and_then(|m| if m.is_file() { m.modified().map(Some) } else { Ok(None) }) {
                Ok(Some(modified)) => {
                    entries.insert(entry.into_path(), modified);
                }
                Ok(None) => continue,
                // Removed concurrently, or a dangling link; absent for this cycle.
                Err(e) => {
                    if e.kind() != ErrorKind::NotFound {
                        tracing::debug!(path = %entry.path().display(), error = %e, "Skipping unreadable file");
                    }
                    continue;
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.entries.get(path).copied()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Paths that were added, removed or re-stamped relative to `previous`.
    pub fn changed_paths(&self, previous: &DirectorySnapshot) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(path, time)| previous.entries.get(*path) != Some(*time))
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(
            previous
                .entries
                .keys()
                .filter(|path| !self.entries.contains_key(*path))
                .cloned(),
        );
        changed.sort();
        changed
    }
}
