//! Atomic writes into mirror trees

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Create `path` and its parents. Existing directories are not an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Write content atomically to a file with locking.
///
/// Writes to a temp file in the same directory, then renames over the
/// target so a reader walking the mirror never sees a half-written file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed { path: path.to_path_buf() })?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all())
        .map_err(|e| Error::io(&temp_path, e));

    // Released on drop as well
    let _ = FileExt::unlock(&temp_file);
    drop(temp_file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(path, e)
    })
}

/// Delete everything under `root` that is not listed in `keep`.
///
/// `keep` holds full paths of files and directories to retain; a kept
/// file's parent directories must be listed too. `root` itself is never
/// removed. Returns the number of entries deleted.
pub fn remove_untracked(root: &Path, keep: &BTreeSet<PathBuf>) -> Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound) => continue,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                return Err(Error::io(path, e.into()));
            }
        };
        if keep.contains(entry.path()) {
            continue;
        }

        let result = if entry.file_type().is_dir() {
            fs::remove_dir_all(entry.path())
        } else {
            fs::remove_file(entry.path())
        };
        match result {
            Ok(()) => {
                tracing::debug!(path = %entry.path().display(), "Removed untracked entry");
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(entry.path(), e)),
        }
    }
    Ok(removed)
}
