//! Error types for repo-source

use std::path::PathBuf;

/// Result type for repo-source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while describing a source
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Cannot derive a mirror name from '{uri}'")]
    UnnamedMirror { uri: String },

    #[error("Unknown stream type '{value}' (expected 'livestream' or 'offlinestream')")]
    UnknownStreamType { value: String },

    #[error("Mirror parent {path} could not be created: {source}")]
    MirrorParent {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn invalid(uri: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}
