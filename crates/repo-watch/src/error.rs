//! Error types for repo-watch
//!
//! Most variants are configuration errors raised while building watchers.
//! `StopTimedOut` and `UnknownWatcher` come from supervisor control. Fetch
//! failures never surface as errors; they become
//! [`FetchOutcome::Failed`](crate::FetchOutcome::Failed).

use std::path::PathBuf;
use std::time::Duration;

/// Result type for repo-watch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or controlling watchers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Source error: {0}")]
    Source(#[from] repo_source::Error),

    #[error("'{uri}' requires a username (pass --scp-user or put it in the URI)")]
    MissingUsername { uri: String },

    #[error("Livestream mode needs an http(s) git remote, got '{scheme}' for '{uri}'")]
    LivestreamUnsupported { uri: String, scheme: String },

    #[error("'{uri}' has no host")]
    MissingHost { uri: String },

    #[error("Mirror path {path} is already watched by '{existing}'")]
    DuplicateMirror { path: PathBuf, existing: String },

    #[error("A watcher named '{name}' is already running")]
    DuplicateName { name: String },

    #[error("Watcher '{name}' did not finish its cycle within {timeout:?}")]
    StopTimedOut { name: String, timeout: Duration },

    #[error("No watcher named '{name}'")]
    UnknownWatcher { name: String },

    #[error("Collaborator failed on '{name}': {message}")]
    Collaborator { name: String, message: String },
}
