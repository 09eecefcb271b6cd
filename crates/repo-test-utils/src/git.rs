//! Git source repositories for mirror tests.
//!
//! Every fixture uses `git2` directly so tests do not depend on a `git`
//! binary being installed.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};

/// Initialises an empty repository whose HEAD points at `main`.
///
/// Realism level: **REAL**: valid git object store, empty history.
///
/// # Panics
/// Panics if `git2::Repository::init_opts` fails.
pub fn empty_repo(path: &Path) -> Repository {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    Repository::init_opts(path, &options).unwrap_or_else(|e| {
        panic!(
            "empty_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Initialises a repository on `main` with `README.md` committed.
///
/// Realism level: **REAL WITH HISTORY**: one commit on `main`.
///
/// # Panics
/// Panics if any git operation fails.
pub fn source_repo(path: &Path) -> Repository {
    let repo = empty_repo(path);
    commit_file(&repo, "README.md", "# Source\n", "Initial commit");
    repo
}

/// Writes `name` into the work tree, stages it and commits on HEAD.
///
/// Returns the new commit id.
///
/// # Panics
/// Panics if the repository is bare or any git operation fails.
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo
        .workdir()
        .unwrap_or_else(|| panic!("commit_file: repository is bare"));
    let target = workdir.join(name);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("commit_file: failed to create {}: {e}", parent.display()));
    }
    fs::write(&target, content)
        .unwrap_or_else(|e| panic!("commit_file: failed to write {}: {e}", target.display()));

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = Signature::now("Test User", "test@test.com").unwrap();
    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.target())
        .map(|oid| repo.find_commit(oid).unwrap());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap_or_else(|e| panic!("commit_file: commit failed: {e}"))
}

/// The URL a local clone of `path` is made from.
pub fn clone_url(path: &Path) -> String {
    path.display().to_string()
}
