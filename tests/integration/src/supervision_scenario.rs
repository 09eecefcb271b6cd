//! End-to-end: several sources under one supervisor, multiple-root layout.

use std::time::Duration;

use pretty_assertions::assert_eq;
use repo_fs::{GitrootMode, RootSet};
use repo_source::{RepoMirror, UriDescriptor};
use repo_test_utils::{RecordingConnector, StubTree, TestTree};
use repo_transfer::RemotePath;
use repo_watch::{FetchOutcome, LocalDirFetcher, TransferFetcher, WatchState, Watcher, WatcherSupervisor};
use tempfile::TempDir;

const TICK: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(10);

#[test]
fn test_multiple_mode_mirrors_resolve_against_primary() {
    let cache = TempDir::new().unwrap();
    let first = RootSet::configure(GitrootMode::Multiple, cache.path()).unwrap();
    let second = RootSet::configure(GitrootMode::Multiple, cache.path()).unwrap();

    assert_eq!(first.roots().len(), 2);
    assert_eq!(first.primary(), second.primary());
    assert!(first.roots().iter().all(|root| root.is_dir()));

    let mirror = RepoMirror::new(
        UriDescriptor::parse("ftp://files.example.com/pub/project").unwrap(),
        &first,
    )
    .unwrap();
    assert_eq!(mirror.local_path(), first.primary().join("project"));
    assert!(first.secondary().unwrap().read_dir().unwrap().next().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mixed_sources_run_independently_and_release_sessions() {
    let cache = TempDir::new().unwrap();
    let roots = RootSet::configure(GitrootMode::Single, cache.path()).unwrap();

    let remote = RecordingConnector::new(
        StubTree::with_markers("/srv/project").file("src/main.rs", "fn main() {}\n"),
    );
    let remote_dest = roots.primary().join("project");
    let transfer = TransferFetcher::new(remote.clone(), RemotePath::new("/srv/project"), &remote_dest);

    let tree = TestTree::new();
    tree.write("local.txt", "l");

    let mut supervisor = WatcherSupervisor::new();
    supervisor
        .spawn(Watcher::new("project", &remote_dest, Box::new(transfer), TICK))
        .unwrap();
    supervisor
        .spawn(Watcher::new("local", tree.root(), Box::new(LocalDirFetcher::new(tree.root())), TICK))
        .unwrap();

    for name in ["project", "local"] {
        let mut status = supervisor.watch_status(name).unwrap();
        tokio::time::timeout(WAIT, status.wait_for(|s| s.cycles >= 2))
            .await
            .unwrap()
            .unwrap();
    }

    assert!(remote_dest.join("src/main.rs").is_file());
    assert_eq!(
        supervisor.status("project").unwrap().last_outcome,
        Some(FetchOutcome::Unchanged)
    );

    let stopped = supervisor.shutdown().await;
    assert_eq!(stopped.len(), 2);
    assert!(stopped.iter().all(|s| s.state == WatchState::Stopped));
    assert_eq!(remote.open_sessions(), 0);
    assert!(supervisor.is_empty());
}
