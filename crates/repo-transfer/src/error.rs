//! Error types for repo-transfer

use std::path::PathBuf;

/// Result type for repo-transfer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a file-transfer remote
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    #[error("Authentication as '{username}' was rejected: {message}")]
    Auth { username: String, message: String },

    #[error("Protocol error on {path}: {message}")]
    Protocol { path: String, message: String },

    #[error("Remote {path} is missing marker entries: {}", missing.join(", "))]
    MissingMarkers { path: String, missing: Vec<String> },

    #[error("A username is required to connect to {host}")]
    MissingUsername { host: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filesystem error: {0}")]
    Fs(#[from] repo_fs::Error),

    #[error("Transfer cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the session itself is gone, as opposed to a single entry
    /// failing.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Auth { .. })
    }

    pub(crate) fn protocol(path: &str, message: impl ToString) -> Self {
        Self::Protocol {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}
