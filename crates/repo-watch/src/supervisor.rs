//! Runs many watchers side by side

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Collaborator, CollaboratorRun, Error, MirrorEvent, Result, WatchState, WatchStatus, Watcher};

/// How long `stop` and `shutdown` wait for a loop to finish its cycle.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 256;

struct WatchHandle {
    cancel: CancellationToken,
    status: watch::Receiver<WatchStatus>,
    task: JoinHandle<WatchStatus>,
    mirror_path: PathBuf,
}

/// Owns every watch loop of the process.
///
/// Each loop gets a child of the supervisor's token, so one repository
/// can be stopped alone and `shutdown` stops them all.
pub struct WatcherSupervisor {
    shutdown: CancellationToken,
    watchers: BTreeMap<String, WatchHandle>,
    events: broadcast::Sender<MirrorEvent>,
    stop_timeout: Duration,
}

impl Default for WatcherSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl WatcherSupervisor {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shutdown: CancellationToken::new(),
            watchers: BTreeMap::new(),
            events,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Start `watcher`'s loop on the runtime.
    ///
    /// Rejects a second watcher with the same name or mirror path so a
    /// mirror never has two writers.
    pub fn spawn(&mut self, watcher: Watcher) -> Result<()> {
        let name = watcher.name();
        let mirror_path = watcher.mirror_path();

        if self.watchers.contains_key(&name) {
            return Err(Error::DuplicateName { name });
        }
        if let Some((existing, _)) = self
            .watchers
            .iter()
            .find(|(_, handle)| handle.mirror_path == mirror_path)
        {
            return Err(Error::DuplicateMirror {
                path: mirror_path,
                existing: existing.clone(),
            });
        }

        let cancel = self.shutdown.child_token();
        let status = watcher.subscribe();
        let watcher = watcher.with_events(self.events.clone());
        let task = tokio::spawn(watcher.run(cancel.clone()));

        tracing::debug!(repo = %name, path = %mirror_path.display(), "Watcher spawned");
        self.watchers.insert(
            name,
            WatchHandle {
                cancel,
                status,
                task,
                mirror_path,
            },
        );
        Ok(())
    }

    /// Names of every supervised watcher.
    pub fn names(&self) -> Vec<String> {
        self.watchers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn status(&self, name: &str) -> Option<WatchStatus> {
        self.watchers
            .get(name)
            .map(|handle| handle.status.borrow().clone())
    }

    /// Current status of every watcher, ordered by name.
    pub fn statuses(&self) -> Vec<WatchStatus> {
        self.watchers
            .values()
            .map(|handle| handle.status.borrow().clone())
            .collect()
    }

    /// Status stream for one watcher.
    pub fn watch_status(&self, name: &str) -> Option<watch::Receiver<WatchStatus>> {
        self.watchers.get(name).map(|handle| handle.status.clone())
    }

    /// Stream of Changed notifications from every watcher.
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.events.subscribe()
    }

    /// Cancel one watcher and wait for its loop to finish.
    ///
    /// If the loop is still inside a cycle when the stop timeout runs out,
    /// the watcher stays supervised (already cancelled) and
    /// [`Error::StopTimedOut`] is returned; call `stop` again to keep
    /// waiting.
    pub async fn stop(&mut self, name: &str) -> Result<WatchStatus> {
        let handle = self
            .watchers
            .remove(name)
            .ok_or_else(|| Error::UnknownWatcher {
                name: name.to_string(),
            })?;
        handle.cancel.cancel();
        match Self::join(name, handle, self.stop_timeout).await {
            Ok(status) => Ok(status),
            Err(handle) => {
                self.watchers.insert(name.to_string(), handle);
                Err(Error::StopTimedOut {
                    name: name.to_string(),
                    timeout: self.stop_timeout,
                })
            }
        }
    }

    /// Cancel every watcher and wait for the loops to finish.
    ///
    /// Returns the final status of every loop that finished within the
    /// stop timeout. Loops still mid-cycle stay supervised, so a caller
    /// that needs every session released repeats until [`Self::is_empty`].
    pub async fn shutdown(&mut self) -> Vec<WatchStatus> {
        self.shutdown.cancel();
        let watchers = std::mem::take(&mut self.watchers);

        let mut finished = Vec::with_capacity(watchers.len());
        for (name, handle) in watchers {
            match Self::join(&name, handle, self.stop_timeout).await {
                Ok(status) => finished.push(status),
                Err(handle) => {
                    self.watchers.insert(name, handle);
                }
            }
        }

        if self.watchers.is_empty() {
            tracing::info!(count = finished.len(), "All watchers stopped");
        } else {
            tracing::warn!(
                stopped = finished.len(),
                pending = self.watchers.len(),
                "Some watchers are still finishing their cycle"
            );
        }
        finished
    }

    /// Wait for a cancelled loop, handing the handle back if it is still
    /// running after `timeout`.
    async fn join(
        name: &str,
        handle: WatchHandle,
        timeout: Duration,
    ) -> std::result::Result<WatchStatus, WatchHandle> {
        let WatchHandle {
            cancel,
            status,
            mut task,
            mirror_path,
        } = handle;

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(final_status)) => Ok(final_status),
            Ok(Err(e)) => {
                // The task is gone; session guards were dropped while unwinding.
                tracing::warn!(repo = %name, error = %e, "Watch task failed");
                let mut last = status.borrow().clone();
                last.state = WatchState::Stopped;
                Ok(last)
            }
            Err(_) => {
                tracing::warn!(repo = %name, timeout = ?timeout, "Watch task still running after stop timeout");
                Err(WatchHandle {
                    cancel,
                    status,
                    task,
                    mirror_path,
                })
            }
        }
    }

    /// Invoke `collaborator` once against every watcher's current mirror.
    ///
    /// Watchers that have not completed a cycle yet, or that have neither a
    /// mirror on disk nor a reference listing, are reported as skipped.
    pub async fn run_collaborator(&self, collaborator: &dyn Collaborator) -> Vec<CollaboratorRun> {
        let mut runs = Vec::with_capacity(self.watchers.len());
        for status in self.statuses() {
            let result = if status.last_outcome.is_none() {
                Err(Error::Collaborator {
                    name: status.name.clone(),
                    message: "no fetch cycle has completed yet".to_string(),
                })
            } else if status.refs.is_empty() && !status.mirror_path.exists() {
                Err(Error::Collaborator {
                    name: status.name.clone(),
                    message: format!("mirror {} does not exist", status.mirror_path.display()),
                })
            } else {
                tracing::debug!(repo = %status.name, collaborator = collaborator.name(), "Invoking collaborator");
                collaborator.inspect(&status).await
            };
            runs.push(CollaboratorRun {
                repository: status.name,
                result,
            });
        }
        runs
    }
}

impl Drop for WatcherSupervisor {
    fn drop(&mut self) {
        // Loops still running observe this at their next suspension point
        self.shutdown.cancel();
    }
}
