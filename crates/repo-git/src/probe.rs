//! Read-only listing of a remote's references

use std::fmt;

use git2::{Direction, Remote};

use crate::auth::{GitAuth, callbacks};
use crate::{Error, Result};

/// One advertised reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    pub name: String,
    pub oid: String,
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.oid, self.name)
    }
}

/// Lists a remote's references without a local repository.
#[derive(Debug, Clone)]
pub struct RefProbe {
    remote_url: String,
    auth: Option<GitAuth>,
}

impl RefProbe {
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, auth: Option<GitAuth>) -> Self {
        self.auth = auth;
        self
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Query the remote for its reference list.
    pub fn list(&self) -> Result<Vec<RemoteRef>> {
        let list_failed = |e: git2::Error| Error::ListFailed {
            url: self.remote_url.clone(),
            message: e.message().to_string(),
        };

        let mut remote = Remote::create_detached(self.remote_url.as_str()).map_err(list_failed)?;
        let connection = remote
            .connect_auth(Direction::Fetch, Some(callbacks(self.auth.as_ref())), None)
            .map_err(list_failed)?;

        let refs = connection
            .list()
            .map_err(list_failed)?
            .iter()
            .map(|head| RemoteRef {
                name: head.name().to_string(),
                oid: head.oid().to_string(),
            })
            .collect();

        Ok(refs)
    }
}

/// Render a listing the way `git ls-remote` prints it.
pub fn format_listing(refs: &[RemoteRef]) -> String {
    refs.iter()
        .map(RemoteRef::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_listing() {
        let refs = vec![
            RemoteRef {
                name: "HEAD".into(),
                oid: "a".repeat(40),
            },
            RemoteRef {
                name: "refs/heads/main".into(),
                oid: "a".repeat(40),
            },
        ];
        let listing = format_listing(&refs);
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.ends_with("\trefs/heads/main"));
    }
}
