//! Local directory variant

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use repo_fs::DirectorySnapshot;
use tokio_util::sync::CancellationToken;

use super::{Fetcher, run_blocking};
use crate::FetchOutcome;

/// Treats a local directory as its own mirror and compares snapshots.
#[derive(Debug, Clone)]
pub struct LocalDirFetcher {
    root: PathBuf,
    baseline: Option<DirectorySnapshot>,
}

impl LocalDirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            baseline: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The snapshot adopted by the last successful cycle.
    pub fn baseline(&self) -> Option<&DirectorySnapshot> {
        self.baseline.as_ref()
    }

    async fn capture(&self) -> Result<DirectorySnapshot, String> {
        let root = self.root.clone();
        run_blocking(move || DirectorySnapshot::capture(&root))
            .await?
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Fetcher for LocalDirFetcher {
    async fn initial_fetch(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::cancelled();
        }
        match self.capture().await {
            Ok(snapshot) => {
                tracing::debug!(path = %self.root.display(), files = snapshot.len(), "Baseline snapshot taken");
                self.baseline = Some(snapshot);
                FetchOutcome::Changed
            }
            Err(reason) => FetchOutcome::Failed(reason),
        }
    }

    async fn refresh(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::cancelled();
        }
        if self.baseline.is_none() {
            return self.initial_fetch(cancel).await;
        }
        match self.capture().await {
            Ok(snapshot) => {
                if self.baseline.as_ref() == Some(&snapshot) {
                    FetchOutcome::Unchanged
                } else {
                    if let Some(previous) = &self.baseline {
                        tracing::debug!(
                            path = %self.root.display(),
                            changed = snapshot.changed_paths(previous).len(),
                            "Snapshot differs from baseline"
                        );
                    }
                    self.baseline = Some(snapshot);
                    FetchOutcome::Changed
                }
            }
            Err(reason) => FetchOutcome::Failed(reason),
        }
    }

    fn kind(&self) -> &'static str {
        "localdir"
    }
}
