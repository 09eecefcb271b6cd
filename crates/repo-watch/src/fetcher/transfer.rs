//! FTP and SFTP variant

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use repo_transfer::{Connector, Error, RemoteManifest, RemotePath, sync_tree};
use tokio_util::sync::CancellationToken;

use super::{Fetcher, run_blocking};
use crate::FetchOutcome;

/// Full recursive download each cycle, change decided by manifest.
///
/// The transfer runs on the blocking pool and is always awaited to the
/// end; the walk itself watches the token and stops between entries, so
/// the session is closed before the cycle returns.
pub struct TransferFetcher<C> {
    connector: C,
    root: RemotePath,
    dest: PathBuf,
    manifest: Option<RemoteManifest>,
}

impl<C> TransferFetcher<C>
where
    C: Connector + Clone + 'static,
{
    pub fn new(connector: C, root: RemotePath, dest: impl Into<PathBuf>) -> Self {
        Self {
            connector,
            root,
            dest: dest.into(),
            manifest: None,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Manifest of the last completed download.
    pub fn manifest(&self) -> Option<&RemoteManifest> {
        self.manifest.as_ref()
    }

    async fn cycle(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::cancelled();
        }

        let connector = self.connector.clone();
        let root = self.root.clone();
        let dest = self.dest.clone();
        let token = cancel.clone();
        let joined = run_blocking(move || sync_tree(&connector, &root, &dest, &token)).await;

        match joined {
            Err(reason) => FetchOutcome::Failed(reason),
            Ok(Err(Error::Cancelled)) => FetchOutcome::cancelled(),
            Ok(Err(Error::MissingMarkers { missing, .. })) => {
                // Next passing cycle downloads everything and reports Changed
                self.manifest = None;
                FetchOutcome::Failed(format!("missing markers: {}", missing.join(", ")))
            }
            Ok(Err(e)) => FetchOutcome::failed(e),
            Ok(Ok(report)) if report.cancelled => FetchOutcome::cancelled(),
            Ok(Ok(report)) => {
                if !report.failures.is_empty() {
                    tracing::warn!(
                        endpoint = %self.connector.endpoint(),
                        failed = report.failures.len(),
                        downloaded = report.files,
                        "Transfer completed with skipped entries"
                    );
                }
                let changed = report.manifest.differs_from(self.manifest.as_ref());
                self.manifest = Some(report.manifest);
                FetchOutcome::from_changed(changed)
            }
        }
    }
}

#[async_trait]
impl<C> Fetcher for TransferFetcher<C>
where
    C: Connector + Clone + 'static,
{
    async fn initial_fetch(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        self.cycle(cancel).await
    }

    async fn refresh(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        self.cycle(cancel).await
    }

    fn kind(&self) -> &'static str {
        "transfer"
    }
}
