//! One repository's watch loop
//!
//! ```text
//! Idle ──tick──▶ Syncing ──ok──▶ Idle
//!                   │
//!                   └──failed──▶ Failed ──tick──▶ Syncing
//! any state ──cancel──▶ Stopped
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use repo_git::RemoteRef;
use repo_source::{RepoMirror, StreamType};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::fetcher::default_interval;
use crate::{FetchOutcome, Fetcher, ProtocolFetcher, Result};

/// Where a watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting for the next tick.
    Idle,
    /// A fetch cycle is in flight.
    Syncing,
    /// The last cycle failed; the next tick retries.
    Failed,
    /// The loop has exited.
    Stopped,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Snapshot of a watcher, as seen from outside the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchStatus {
    pub name: String,
    pub kind: &'static str,
    pub mirror_path: PathBuf,
    pub state: WatchState,
    pub last_outcome: Option<FetchOutcome>,
    /// Completed cycles, failed ones included.
    pub cycles: u64,
    pub last_checked: Option<DateTime<Utc>>,
    /// Latest reference listing, for livestream watchers.
    pub refs: Vec<RemoteRef>,
}

/// Published whenever a cycle reports [`FetchOutcome::Changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorEvent {
    pub name: String,
    pub mirror_path: PathBuf,
    pub cycle: u64,
    pub at: DateTime<Utc>,
}

/// Drives one fetcher on a fixed interval.
pub struct Watcher {
    fetcher: Box<dyn Fetcher>,
    interval: Duration,
    status: watch::Sender<WatchStatus>,
    events: Option<broadcast::Sender<MirrorEvent>>,
}

impl Watcher {
    pub fn new(
        name: impl Into<String>,
        mirror_path: impl Into<PathBuf>,
        fetcher: Box<dyn Fetcher>,
        interval: Duration,
    ) -> Self {
        let status = WatchStatus {
            name: name.into(),
            kind: fetcher.kind(),
            mirror_path: mirror_path.into(),
            state: WatchState::Idle,
            last_outcome: None,
            cycles: 0,
            last_checked: None,
            refs: Vec::new(),
        };
        let (status, _) = watch::channel(status);
        Self {
            fetcher,
            interval,
            status,
            events: None,
        }
    }

    /// Build the watcher for a configured source.
    ///
    /// All configuration errors surface here, before any loop runs.
    pub fn for_source(
        mirror: &RepoMirror,
        stream_type: StreamType,
        interval: Option<Duration>,
    ) -> Result<Self> {
        let fetcher = ProtocolFetcher::for_source(mirror, stream_type)?;
        Ok(Self::new(
            mirror.name(),
            mirror.local_path(),
            Box::new(fetcher),
            interval.unwrap_or_else(|| default_interval(stream_type)),
        ))
    }

    /// Also publish Changed outcomes on `events`.
    pub fn with_events(mut self, events: broadcast::Sender<MirrorEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn name(&self) -> String {
        self.status.borrow().name.clone()
    }

    pub fn mirror_path(&self) -> PathBuf {
        self.status.borrow().mirror_path.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Receiver for status updates; readable after the loop ends.
    pub fn subscribe(&self) -> watch::Receiver<WatchStatus> {
        self.status.subscribe()
    }

    /// Run cycles until `cancel` fires, returning the final status.
    ///
    /// A cycle in flight is never abandoned: the fetcher sees the token
    /// and stops at its next safe point, and only the interval sleep races
    /// against cancellation.
    pub async fn run(mut self, cancel: CancellationToken) -> WatchStatus {
        let name = self.name();
        tracing::info!(repo = %name, kind = self.fetcher.kind(), interval = ?self.interval, "Watch loop started");

        let mut initialised = false;
        while !cancel.is_cancelled() {
            self.set_state(WatchState::Syncing);

            let outcome = if initialised {
                self.fetcher.refresh(&cancel).await
            } else {
                self.fetcher.initial_fetch(&cancel).await
            };
            if !outcome.is_failed() {
                initialised = true;
            }
            self.record(&name, outcome);

            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.set_state(WatchState::Stopped);
        tracing::info!(repo = %name, "Watch loop stopped");
        self.status.borrow().clone()
    }

    fn set_state(&self, state: WatchState) {
        self.status.send_modify(|status| status.state = state);
    }

    fn record(&self, name: &str, outcome: FetchOutcome) {
        let now = Utc::now();
        match &outcome {
            FetchOutcome::Changed => tracing::info!(repo = %name, "Mirror changed"),
            FetchOutcome::Unchanged => tracing::debug!(repo = %name, "Mirror unchanged"),
            FetchOutcome::Failed(reason) if outcome.is_cancelled() => {
                tracing::debug!(repo = %name, reason = %reason, "Cycle interrupted")
            }
            FetchOutcome::Failed(reason) => {
                tracing::warn!(repo = %name, reason = %reason, "Fetch cycle failed")
            }
        }

        let refs = self.fetcher.remote_refs().map(<[RemoteRef]>::to_vec);
        let changed = outcome.is_changed();
        let failed = outcome.is_failed();

        let mut cycle = 0;
        let mut mirror_path = PathBuf::new();
        self.status.send_modify(|status| {
            status.cycles += 1;
            status.last_checked = Some(now);
            status.state = if failed { WatchState::Failed } else { WatchState::Idle };
            status.last_outcome = Some(outcome);
            if let Some(refs) = refs {
                status.refs = refs;
            }
            cycle = status.cycles;
            mirror_path = status.mirror_path.clone();
        });

        if changed && let Some(events) = &self.events {
            // No subscribers is fine
            let _ = events.send(MirrorEvent {
                name: name.to_string(),
                mirror_path,
                cycle,
                at: now,
            });
        }
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("status", &*self.status.borrow())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl WatchStatus {
    pub fn mirror_path(&self) -> &Path {
        &self.mirror_path
    }
}
