//! Error types for repo-git

use std::path::PathBuf;

/// Result type for repo-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Failed to fetch from {remote}: {message}")]
    FetchFailed { remote: String, message: String },

    #[error("Failed to list references of {url}: {message}")]
    ListFailed { url: String, message: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("No default branch could be resolved on remote '{remote}'")]
    NoDefaultBranch { remote: String },

    #[error("{path} is not a git mirror")]
    NotAMirror { path: PathBuf },
}
