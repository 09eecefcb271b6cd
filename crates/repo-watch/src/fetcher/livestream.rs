//! Read-only reference probe variant

use async_trait::async_trait;
use repo_git::{GitAuth, RefProbe, RemoteRef};
use tokio_util::sync::CancellationToken;

use super::{Fetcher, run_blocking};
use crate::FetchOutcome;

/// Lists the remote's references each cycle without writing anything.
///
/// Changed when the listing differs from the previous probe.
#[derive(Debug, Clone)]
pub struct LivestreamFetcher {
    probe: RefProbe,
    refs: Option<Vec<RemoteRef>>,
}

impl LivestreamFetcher {
    pub fn new(remote_url: impl Into<String>, auth: Option<GitAuth>) -> Self {
        Self {
            probe: RefProbe::new(remote_url).with_auth(auth),
            refs: None,
        }
    }

    async fn probe(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        if cancel.is_cancelled() {
            return FetchOutcome::cancelled();
        }

        let probe = self.probe.clone();
        match run_blocking(move || probe.list()).await {
            Ok(Ok(refs)) => {
                let changed = self.refs.as_ref() != Some(&refs);
                tracing::debug!(url = %self.probe.remote_url(), count = refs.len(), changed, "References probed");
                self.refs = Some(refs);
                FetchOutcome::from_changed(changed)
            }
            Ok(Err(e)) => FetchOutcome::failed(e),
            Err(reason) => FetchOutcome::Failed(reason),
        }
    }
}

#[async_trait]
impl Fetcher for LivestreamFetcher {
    async fn initial_fetch(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        self.probe(cancel).await
    }

    async fn refresh(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        self.probe(cancel).await
    }

    fn remote_refs(&self) -> Option<&[RemoteRef]> {
        self.refs.as_deref()
    }

    fn kind(&self) -> &'static str {
        "livestream"
    }
}
