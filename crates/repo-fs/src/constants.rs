//! Well-known names used by the cache layout and remote checks.

use std::path::Path;

/// Environment variable naming the active cache root(s).
///
/// Holds one path in single mode and a comma-separated pair in multiple mode.
pub const GITROOT_ENV: &str = "GITROOT";

/// Well-known entries on disk and on remotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoPath {
    /// The `.git` entry (version-control marker)
    GitDir,
    /// The `.gitlang` entry (language-manifest marker)
    LanguageManifest,
    /// Directory name of the single-mode cache root
    SingleRoot,
    /// Directory name of the primary multiple-mode cache root
    PrimaryRoot,
    /// Directory name of the secondary multiple-mode cache root
    SecondaryRoot,
}

impl RepoPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::LanguageManifest => ".gitlang",
            Self::SingleRoot => "gitroot_single",
            Self::PrimaryRoot => "gitroot_multi1",
            Self::SecondaryRoot => "gitroot_multi2",
        }
    }

    /// Marker entries that must both be present at a remote root before
    /// it is mirrored.
    pub fn markers() -> [RepoPath; 2] {
        [Self::GitDir, Self::LanguageManifest]
    }
}

impl AsRef<Path> for RepoPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
