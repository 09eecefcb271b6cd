//! Local mirror of a remote git repository

use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{AutotagOption, Direction, FetchOptions, Oid, Repository, ResetType};

use crate::auth::{GitAuth, callbacks};
use crate::{Error, Result};

const REMOTE_NAME: &str = "origin";

/// What a sync did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResult {
    /// The mirror did not exist and was cloned.
    Cloned { head: Option<Oid> },
    /// The reset moved the local reference.
    Updated { from: Option<Oid>, to: Oid },
    /// The local reference already matched the remote.
    UpToDate { head: Oid },
}

impl SyncResult {
    /// Whether the mirror content may differ from before the sync.
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::UpToDate { .. })
    }

    pub fn head(&self) -> Option<Oid> {
        match self {
            Self::Cloned { head } => *head,
            Self::Updated { to, .. } => Some(*to),
            Self::UpToDate { head } => Some(*head),
        }
    }
}

/// A disposable local mirror of a remote repository.
///
/// Local edits in the mirror are discarded on every update.
#[derive(Debug, Clone)]
pub struct GitMirror {
    remote_url: String,
    local_path: PathBuf,
    auth: Option<GitAuth>,
}

impl GitMirror {
    pub fn new(remote_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: local_path.into(),
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

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Whether a clone is present at the mirror path.
    pub fn exists(&self) -> bool {
        Repository::open(&self.local_path).is_ok()
    }

    /// Clone when the mirror is absent, otherwise fetch and hard-reset.
    pub fn sync(&self) -> Result<SyncResult> {
        if self.exists() {
            self.update()
        } else {
            self.clone_mirror()
        }
    }

    /// Perform a full clone into the mirror path.
    ///
    /// On failure the mirror path is removed again so the next attempt
    /// starts from scratch.
    pub fn clone_mirror(&self) -> Result<SyncResult> {
        let preexisting = self.local_path.exists();
        tracing::info!(url = %self.remote_url, path = %self.local_path.display(), "Cloning mirror");

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks(self.auth.as_ref()));

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options);

        match builder.clone(&self.remote_url, &self.local_path) {
            Ok(repo) => {
                let head = repo.head().ok().and_then(|head| head.target());
                Ok(SyncResult::Cloned { head })
            }
            Err(e) => {
                if !preexisting && self.local_path.exists() {
                    if let Err(cleanup) = std::fs::remove_dir_all(&self.local_path) {
                        tracing::warn!(
                            path = %self.local_path.display(),
                            error = %cleanup,
                            "Failed to remove partial clone"
                        );
                    }
                }
                Err(Error::CloneFailed {
                    url: self.remote_url.clone(),
                    message: e.message().to_string(),
                })
            }
        }
    }

    /// Fetch from the recorded remote and hard-reset to its default branch.
    pub fn update(&self) -> Result<SyncResult> {
        let repo = Repository::open(&self.local_path).map_err(|_| Error::NotAMirror {
            path: self.local_path.clone(),
        })?;
        let before = repo.head().ok().and_then(|head| head.target());

        let advertised = self.fetch(&repo)?;
        let target = resolve_remote_branch(&repo, advertised.as_deref())?;

        let object = repo.find_object(target, None)?;
        if before.is_none() {
            // Unborn HEAD (cloned while the remote was empty)
            let head = repo.find_reference("HEAD")?;
            match head.symbolic_target() {
                Some(name) => {
                    repo.reference(name, target, true, "mirror: initialise")?;
                }
                None => repo.set_head_detached(target)?,
            }
            repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        } else {
            repo.reset(&object, ResetType::Hard, Some(CheckoutBuilder::new().force()))?;
        }

        if before == Some(target) {
            tracing::debug!(path = %self.local_path.display(), head = %target, "Mirror up to date");
            Ok(SyncResult::UpToDate { head: target })
        } else {
            tracing::info!(
                path = %self.local_path.display(),
                from = ?before,
                to = %target,
                "Mirror reset to remote"
            );
            Ok(SyncResult::Updated { from: before, to: target })
        }
    }

    /// Fetch all branches and return the default branch the remote
    /// advertises, if any.
    fn fetch(&self, repo: &Repository) -> Result<Option<String>> {
        let mut remote = repo
            .find_remote(REMOTE_NAME)
            .map_err(|_| Error::RemoteNotFound {
                name: REMOTE_NAME.to_string(),
            })?;

        let fetch_failed = |e: git2::Error| Error::FetchFailed {
            remote: self.remote_url.clone(),
            message: e.message().to_string(),
        };

        let advertised = {
            let connection = remote
                .connect_auth(Direction::Fetch, Some(callbacks(self.auth.as_ref())), None)
                .map_err(fetch_failed)?;
            connection
                .default_branch()
                .ok()
                .and_then(|buf| buf.as_str().map(str::to_string))
        };

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks(self.auth.as_ref()));
        fetch_options.download_tags(AutotagOption::All);

        remote
            .fetch(&[] as &[&str], Some(&mut fetch_options), None)
            .map_err(fetch_failed)?;

        Ok(advertised)
    }
}

/// Resolve the remote-tracking commit to reset to.
///
/// Tries the advertised default branch, then `origin/HEAD`, then
/// `origin/main` and `origin/master`.
fn resolve_remote_branch(repo: &Repository, advertised: Option<&str>) -> Result<Oid> {
    let mut candidates = Vec::new();
    if let Some(branch) = advertised.and_then(|name| name.strip_prefix("refs/heads/")) {
        candidates.push(format!("refs/remotes/{REMOTE_NAME}/{branch}"));
    }
    candidates.push(format!("refs/remotes/{REMOTE_NAME}/HEAD"));
    candidates.push(format!("refs/remotes/{REMOTE_NAME}/main"));
    candidates.push(format!("refs/remotes/{REMOTE_NAME}/master"));

    for name in &candidates {
        if let Ok(reference) = repo.find_reference(name)
            && let Ok(resolved) = reference.resolve()
            && let Some(oid) = resolved.target()
        {
            return Ok(oid);
        }
    }

    Err(Error::NoDefaultBranch {
        remote: REMOTE_NAME.to_string(),
    })
}
