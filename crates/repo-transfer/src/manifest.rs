//! Remote tree manifests used for change detection

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::RemoteEntry;

/// Size and timestamp of one remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl From<&RemoteEntry> for FileStamp {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            size: entry.size,
            modified: entry.modified,
        }
    }
}

/// Relative path to stamp mapping for every file in a remote tree.
///
/// Comparing the manifests of two cycles tells whether anything was
/// added, removed or re-stamped on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteManifest {
    files: BTreeMap<String, FileStamp>,
}

impl RemoteManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relative: impl Into<String>, stamp: FileStamp) {
        self.files.insert(relative.into(), stamp);
    }

    pub fn get(&self, relative: &str) -> Option<&FileStamp> {
        self.files.get(relative)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Whether a file is missing from `previous` or stamped differently.
    ///
    /// A file with neither size nor timestamp always counts as changed.
    pub fn is_stale(&self, relative: &str, previous: Option<&RemoteManifest>) -> bool {
        let Some(current) = self.files.get(relative) else {
            return true;
        };
        if current.size.is_none() && current.modified.is_none() {
            return true;
        }
        previous.and_then(|p| p.get(relative)) != Some(current)
    }

    /// Whether this tree differs from `previous` in any file.
    pub fn differs_from(&self, previous: Option<&RemoteManifest>) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        if self.files.len() != previous.files.len() {
            return true;
        }
        self.files
            .keys()
            .any(|relative| self.is_stale(relative, Some(previous)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stamp(size: u64, secs: u64) -> FileStamp {
        FileStamp {
            size: Some(size),
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
        }
    }

    #[test]
    fn test_equal_manifests_compare_equal() {
        let mut a = RemoteManifest::new();
        a.insert("src/lib.rs", stamp(10, 100));
        let b = a.clone();
        assert_eq!(a, b);
        assert!(!a.is_stale("src/lib.rs", Some(&b)));
        assert!(!a.differs_from(Some(&b)));
        assert!(a.differs_from(None));
    }

    #[test]
    fn test_removed_file_differs() {
        let mut before = RemoteManifest::new();
        before.insert("a", stamp(1, 1));
        before.insert("b", stamp(1, 1));
        let mut after = RemoteManifest::new();
        after.insert("a", stamp(1, 1));
        assert!(after.differs_from(Some(&before)));
    }

    #[test]
    fn test_restamped_file_is_stale() {
        let mut before = RemoteManifest::new();
        before.insert("README", stamp(10, 100));
        let mut after = RemoteManifest::new();
        after.insert("README", stamp(10, 200));
        assert!(after.is_stale("README", Some(&before)));
        assert!(after.is_stale("README", None));
    }

    #[test]
    fn test_unstamped_file_is_always_stale() {
        let mut manifest = RemoteManifest::new();
        let bare = FileStamp { size: None, modified: None };
        manifest.insert("blob", bare);
        assert!(manifest.is_stale("blob", Some(&manifest.clone())));
    }
}
