//! Stream type selection

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// How a repository is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamType {
    /// Read-only probing of the remote reference list; no mirror is written.
    Livestream,
    /// Materialise and refresh a local mirror.
    #[default]
    Offlinestream,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Livestream => write!(f, "livestream"),
            Self::Offlinestream => write!(f, "offlinestream"),
        }
    }
}

impl FromStr for StreamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "livestream" => Ok(Self::Livestream),
            "offlinestream" => Ok(Self::Offlinestream),
            _ => Err(Error::UnknownStreamType {
                value: s.to_string(),
            }),
        }
    }
}
