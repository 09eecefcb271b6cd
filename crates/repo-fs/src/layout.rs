//! Cache root ("gitroot") layout
//!
//! A [`RootSet`] is computed once at startup, materialised on disk and then
//! passed by reference to every watcher. Single mode binds one root;
//! multiple mode binds an ordered pair whose first entry is the primary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, RepoPath, Result};

/// Gitroot mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GitrootMode {
    /// One cache root
    #[default]
    Single,
    /// An ordered pair of cache roots
    Multiple,
}

impl fmt::Display for GitrootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Multiple => write!(f, "multiple"),
        }
    }
}

impl FromStr for GitrootMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            _ => Err(Error::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Default cache base under the user's cache directory.
///
/// Returns `None` when the platform has no notion of a cache directory.
pub fn default_cache_base() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("repo-sync"))
}

/// The materialised set of cache roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSet {
    mode: GitrootMode,
    roots: Vec<PathBuf>,
}

impl RootSet {
    /// Compute the roots for `mode` under `base` and create them.
    ///
    /// Directory creation is idempotent. Permission errors are returned
    /// as-is; callers treat them as fatal.
    pub fn configure(mode: GitrootMode, base: &Path) -> Result<Self> {
        let roots = match mode {
            GitrootMode::Single => vec![base.join(RepoPath::SingleRoot)],
            GitrootMode::Multiple => vec![
                base.join(RepoPath::PrimaryRoot),
                base.join(RepoPath::SecondaryRoot),
            ],
        };
        Self::materialize(mode, roots)
    }

    /// Build the roots from the value of the [`crate::GITROOT_ENV`]
    /// variable and create them.
    ///
    /// Single mode takes one path. Multiple mode takes exactly two
    /// comma-separated, distinct paths.
    pub fn from_env_value(mode: GitrootMode, value: &str) -> Result<Self> {
        let parts: Vec<PathBuf> = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect();

        match (mode, parts.len()) {
            (GitrootMode::Single, 1) | (GitrootMode::Multiple, 2) => {}
            (GitrootMode::Single, n) => {
                return Err(Error::Gitroot {
                    message: format!("single mode expects one root, got {n} in '{value}'"),
                });
            }
            (GitrootMode::Multiple, n) => {
                return Err(Error::Gitroot {
                    message: format!("multiple mode expects two roots, got {n} in '{value}'"),
                });
            }
        }

        if mode == GitrootMode::Multiple {
            // Spellings like `a` and `./a` name the same directory
            let mut resolved = Vec::with_capacity(parts.len());
            for part in &parts {
                std::fs::create_dir_all(part).map_err(|e| Error::io(part, e))?;
                resolved.push(dunce::canonicalize(part).map_err(|e| Error::io(part, e))?);
            }
            if resolved[0] == resolved[1] {
                return Err(Error::Gitroot {
                    message: format!("multiple mode roots must differ, got '{value}'"),
                });
            }
        }

        Self::materialize(mode, parts)
    }

    /// Resolve the roots from an explicit value if present, otherwise from
    /// `default_base`.
    pub fn resolve(
        mode: GitrootMode,
        env_value: Option<&str>,
        default_base: Option<&Path>,
    ) -> Result<Self> {
        match (env_value, default_base) {
            (Some(value), _) if !value.trim().is_empty() => Self::from_env_value(mode, value),
            (_, Some(base)) => Self::configure(mode, base),
            _ => Err(Error::MissingEnv {
                var: crate::GITROOT_ENV.to_string(),
            }),
        }
    }

    fn materialize(mode: GitrootMode, roots: Vec<PathBuf>) -> Result<Self> {
        for root in &roots {
            std::fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;
        }
        tracing::info!(mode = %mode, roots = ?roots, "Gitroot configured");
        Ok(Self { mode, roots })
    }

    pub fn mode(&self) -> GitrootMode {
        self.mode
    }

    /// The root used whenever a single root is required.
    pub fn primary(&self) -> &Path {
        &self.roots[0]
    }

    /// The second root in multiple mode.
    pub fn secondary(&self) -> Option<&Path> {
        self.roots.get(1).map(PathBuf::as_path)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Render the roots in the [`crate::GITROOT_ENV`] format.
    pub fn env_value(&self) -> String {
        self.roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
