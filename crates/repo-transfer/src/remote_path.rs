//! Forward-slash paths on a remote server

use std::path::{Path, PathBuf};

/// A path on the remote side, always using `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    inner: String,
}

impl RemotePath {
    /// Normalise backslashes and drop a trailing slash (except for `/`).
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        let trimmed = normalized.trim_end_matches('/');
        let inner = if trimmed.is_empty() && normalized.starts_with('/') {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Join a single entry name.
    pub fn join(&self, name: &str) -> Self {
        let name = name.trim_matches('/');
        let inner = if self.inner.is_empty() {
            name.to_string()
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, name)
        } else {
            format!("{}/{}", self.inner, name)
        };
        Self { inner }
    }

    /// This path relative to `base`, if it lies underneath it.
    pub fn strip_prefix(&self, base: &RemotePath) -> Option<&str> {
        if base.inner == "/" {
            return self.inner.strip_prefix('/');
        }
        self.inner
            .strip_prefix(base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Map onto a local directory, one component at a time.
    pub fn to_local(&self, base: &RemotePath, local_root: &Path) -> PathBuf {
        let mut local = local_root.to_path_buf();
        if let Some(relative) = self.strip_prefix(base) {
            for component in relative.split('/').filter(|c| !c.is_empty() && *c != "..") {
                local.push(component);
            }
        }
        local
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<&str> for RemotePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        assert_eq!(RemotePath::new("/srv/project/").as_str(), "/srv/project");
        assert_eq!(RemotePath::new("/").as_str(), "/");
        assert_eq!(RemotePath::new("srv\\project").as_str(), "srv/project");
    }

    #[test]
    fn test_join_and_strip() {
        let base = RemotePath::new("/srv/project");
        let nested = base.join("src").join("main.rs");
        assert_eq!(nested.as_str(), "/srv/project/src/main.rs");
        assert_eq!(nested.strip_prefix(&base), Some("src/main.rs"));
        assert_eq!(RemotePath::new("/").join("etc").as_str(), "/etc");
    }

    #[test]
    fn test_to_local_ignores_parent_components() {
        let base = RemotePath::new("/srv/project");
        let sneaky = RemotePath::new("/srv/project/../../etc/passwd");
        let local = sneaky.to_local(&base, Path::new("/mirror"));
        assert_eq!(local, PathBuf::from("/mirror/etc/passwd"));
    }
}
