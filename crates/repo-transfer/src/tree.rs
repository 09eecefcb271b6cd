//! Marker pre-check and recursive tree mirroring

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use repo_fs::RepoPath;
use tokio_util::sync::CancellationToken;

use crate::{Connector, Error, FileStamp, RemoteManifest, RemotePath, RemoteSession, Result, SessionGuard};

/// Result of one mirror pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub files: usize,
    pub directories: usize,
    /// Entries that failed individually, with the error message.
    pub failures: Vec<(String, String)>,
    pub manifest: RemoteManifest,
    /// Local entries deleted because the remote no longer has them.
    pub removed: usize,
    /// The pass stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl TransferReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Confirm that `root` holds both marker entries.
pub fn check_markers<S: RemoteSession + ?Sized>(session: &mut S, root: &RemotePath) -> Result<()> {
    let entries = session.list(root.as_str())?;
    let missing: Vec<String> = RepoPath::markers()
        .iter()
        .map(RepoPath::as_str)
        .filter(|marker| !entries.iter().any(|entry| entry.name == *marker))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingMarkers {
            path: root.to_string(),
            missing,
        })
    }
}

/// Download every file under `root` into `dest`.
///
/// A failing file or subdirectory is recorded in the report and its
/// siblings are still processed. Only a lost session aborts the pass.
/// Cancellation is checked before every entry.
///
/// After a complete pass, local entries the remote no longer lists are
/// deleted so `dest` matches the remote tree. An incomplete pass leaves
/// them alone.
pub fn mirror_tree<S: RemoteSession + ?Sized>(
    session: &mut S,
    root: &RemotePath,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<TransferReport> {
    repo_fs::io::ensure_dir(dest)?;
    let mut report = TransferReport::default();
    let mut seen = BTreeSet::new();
    walk(session, root, root, dest, cancel, &mut report, &mut seen)?;

    if report.is_complete() {
        report.removed = repo_fs::io::remove_untracked(dest, &seen)?;
        if report.removed > 0 {
            tracing::debug!(dest = %dest.display(), removed = report.removed, "Pruned entries gone from remote");
        }
    }
    Ok(report)
}

fn walk<S: RemoteSession + ?Sized>(
    session: &mut S,
    root: &RemotePath,
    dir: &RemotePath,
    dest: &Path,
    cancel: &CancellationToken,
    report: &mut TransferReport,
    seen: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    let entries = session.list(dir.as_str())?;

    for entry in entries {
        if cancel.is_cancelled() {
            report.cancelled = true;
            return Ok(());
        }

        let remote = dir.join(&entry.name);
        let local = remote.to_local(root, dest);
        let relative = remote.strip_prefix(root).unwrap_or(remote.as_str()).to_string();

        if entry.is_dir() {
            if let Err(e) = repo_fs::io::ensure_dir(&local) {
                tracing::warn!(path = %remote, error = %e, "Could not create mirror directory");
                report.failures.push((relative, e.to_string()));
                continue;
            }
            report.directories += 1;
            seen.insert(local);
            match walk(session, root, &remote, dest, cancel, report, seen) {
                Ok(()) => {}
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %remote, error = %e, "Skipping remote directory");
                    report.failures.push((relative, e.to_string()));
                }
            }
            if report.cancelled {
                return Ok(());
            }
        } else {
            let downloaded = session
                .download(remote.as_str())
                .and_then(|bytes| repo_fs::io::write_atomic(&local, &bytes).map_err(Error::from));
            match downloaded {
                Ok(()) => {
                    seen.insert(local);
                    report.files += 1;
                    report.manifest.insert(relative, FileStamp::from(&entry));
                }
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %remote, error = %e, "File download failed");
                    report.failures.push((relative, e.to_string()));
                }
            }
        }
    }

    Ok(())
}

/// One full cycle: connect, check markers, mirror, close.
///
/// The session is closed on every exit path.
pub fn sync_tree<C: Connector + ?Sized>(
    connector: &C,
    root: &RemotePath,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<TransferReport> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let endpoint = connector.endpoint();
    tracing::debug!(endpoint = %endpoint, root = %root, "Opening remote session");
    let mut session = SessionGuard::new(connector.connect()?, endpoint.clone());

    check_markers(&mut *session, root)?;
    let report = mirror_tree(&mut *session, root, dest, cancel)?;

    if let Err(e) = session.close() {
        tracing::debug!(endpoint = %endpoint, error = %e, "Error while closing session");
    }

    tracing::debug!(
        endpoint = %endpoint,
        files = report.files,
        directories = report.directories,
        failures = report.failures.len(),
        cancelled = report.cancelled,
        "Remote tree mirrored"
    );
    Ok(report)
}
