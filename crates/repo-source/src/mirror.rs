//! Mirror location derivation

use std::path::{Path, PathBuf};

use repo_fs::RootSet;

use crate::{Error, Result, Scheme, UriDescriptor};

/// A source paired with its local mirror path.
///
/// Remote sources mirror into `<primary-root>/<name>` where `name` is the
/// final path segment without extension. A `localdir` source is its own
/// mirror. The mapping is 1:1 so no two watchers share a mirror path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMirror {
    descriptor: UriDescriptor,
    name: String,
    local_path: PathBuf,
}

impl RepoMirror {
    /// Derive the mirror for `descriptor` and create its parent directory.
    pub fn new(descriptor: UriDescriptor, roots: &RootSet) -> Result<Self> {
        let (name, local_path) = match descriptor.scheme() {
            Scheme::LocalDir => {
                let dir = descriptor.local_dir().ok_or_else(|| Error::UnnamedMirror {
                    uri: descriptor.as_str().to_string(),
                })?;
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| Error::UnnamedMirror {
                        uri: descriptor.as_str().to_string(),
                    })?;
                (name, dir)
            }
            _ => {
                let name = Self::remote_name(&descriptor)?;
                let local_path = roots.primary().join(&name);
                (name, local_path)
            }
        };

        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::MirrorParent {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        tracing::debug!(repo = %name, path = %local_path.display(), "Mirror path derived");

        Ok(Self {
            descriptor,
            name,
            local_path,
        })
    }

    fn remote_name(descriptor: &UriDescriptor) -> Result<String> {
        Path::new(descriptor.path().trim_end_matches('/'))
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| Error::UnnamedMirror {
                uri: descriptor.as_str().to_string(),
            })
    }

    pub fn descriptor(&self) -> &UriDescriptor {
        &self.descriptor
    }

    /// Repository name, used for logging and mirror naming.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local mirror path handed to collaborators.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Whether the mirror directory currently exists.
    pub fn exists(&self) -> bool {
        self.local_path.exists()
    }
}
