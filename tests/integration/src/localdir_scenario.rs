//! End-to-end: a local directory watched under a single cache root.

use std::time::Duration;

use pretty_assertions::assert_eq;
use repo_fs::{DirectorySnapshot, GitrootMode, RootSet};
use repo_source::{RepoMirror, StreamType, UriDescriptor};
use repo_test_utils::TestTree;
use repo_watch::{FetchOutcome, WatchState, Watcher, WatcherSupervisor};
use tempfile::TempDir;

const TICK: Duration = Duration::from_millis(100);
const WAIT: Duration = Duration::from_secs(10);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_added_file_is_reported_then_settles() {
    let cache = TempDir::new().unwrap();
    let roots = RootSet::configure(GitrootMode::Single, cache.path()).unwrap();
    assert_eq!(roots.roots().len(), 1);

    let tree = TestTree::new();
    tree.write("one.txt", "first");
    let mirror = RepoMirror::new(UriDescriptor::parse(&tree.uri()).unwrap(), &roots).unwrap();
    let watcher = Watcher::for_source(&mirror, StreamType::Offlinestream, Some(TICK)).unwrap();
    let name = watcher.name();

    let mut supervisor = WatcherSupervisor::new();
    supervisor.spawn(watcher).unwrap();
    let mut status = supervisor.watch_status(&name).unwrap();

    // Baseline cycle
    let baseline_cycle = tokio::time::timeout(WAIT, status.wait_for(|s| s.cycles >= 1))
        .await
        .unwrap()
        .unwrap()
        .cycles;

    tree.write("two.txt", "second");

    let changed = tokio::time::timeout(
        WAIT,
        status.wait_for(|s| s.cycles > baseline_cycle && s.last_outcome == Some(FetchOutcome::Changed)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(changed.state, WatchState::Idle);

    let snapshot = DirectorySnapshot::capture(mirror.local_path()).unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.contains(&mirror.local_path().join("one.txt")));
    assert!(snapshot.contains(&mirror.local_path().join("two.txt")));

    let settled = tokio::time::timeout(
        WAIT,
        status.wait_for(|s| s.cycles > changed.cycles),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(settled.last_outcome, Some(FetchOutcome::Unchanged));

    let stopped = supervisor.shutdown().await;
    assert_eq!(stopped[0].state, WatchState::Stopped);
}

#[tokio::test]
async fn test_touched_file_is_reported() {
    let cache = TempDir::new().unwrap();
    let roots = RootSet::configure(GitrootMode::Single, cache.path()).unwrap();
    let tree = TestTree::new();
    tree.write("notes.md", "n");
    let mirror = RepoMirror::new(UriDescriptor::parse(&tree.uri()).unwrap(), &roots).unwrap();

    let mut supervisor = WatcherSupervisor::new();
    let mut events = supervisor.subscribe();
    supervisor
        .spawn(Watcher::for_source(&mirror, StreamType::Offlinestream, Some(TICK)).unwrap())
        .unwrap();

    let first = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
    tree.touch_forward("notes.md", 60);
    let second = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();

    assert!(second.cycle > first.cycle);
    assert_eq!(second.mirror_path, mirror.local_path());
    supervisor.shutdown().await;
}
