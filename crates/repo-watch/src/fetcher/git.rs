//! Git mirror variant

use std::path::PathBuf;

use async_trait::async_trait;
use repo_git::{GitAuth, GitMirror, SyncResult};
use tokio_util::sync::CancellationToken;

use super::{Fetcher, run_blocking};
use crate::FetchOutcome;

/// Clones on the first cycle, then fetches and hard-resets.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    mirror: GitMirror,
}

impl GitFetcher {
    pub fn new(remote_url: impl Into<String>, local_path: impl Into<PathBuf>, auth: Option<GitAuth>) -> Self {
        Self {
            mirror: GitMirror::new(remote_url, local_path).with_auth(auth),
        }
    }

    pub fn mirror(&self) -> &GitMirror {
        &self.mirror
    }

    async fn sync(&self, cancel: &CancellationToken) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::cancelled();
        }

        let mirror = self.mirror.clone();
        match run_blocking(move || mirror.sync()).await {
            Ok(Ok(result)) => {
                if let SyncResult::Updated { from, to } = result {
                    tracing::debug!(path = %self.mirror.local_path().display(), ?from, %to, "Mirror moved");
                }
                FetchOutcome::from_changed(result.is_changed())
            }
            Ok(Err(e)) => FetchOutcome::failed(e),
            Err(reason) => FetchOutcome::Failed(reason),
        }
    }
}

#[async_trait]
impl Fetcher for GitFetcher {
    async fn initial_fetch(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        self.sync(cancel).await
    }

    async fn refresh(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        self.sync(cancel).await
    }

    fn kind(&self) -> &'static str {
        "git"
    }
}
