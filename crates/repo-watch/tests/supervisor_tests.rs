//! Watch loops under the supervisor

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::wait_until;
use repo_test_utils::{RecordingConnector, StubTree, TestTree};
use repo_transfer::RemotePath;
use repo_watch::{
    Collaborator, Error, FetchOutcome, LocalDirFetcher, TransferFetcher, WatchState, WatchStatus,
    Watcher, WatcherSupervisor,
};
use tempfile::TempDir;

const ROOT: &str = "/srv/project";
const TICK: Duration = Duration::from_millis(50);

fn transfer_watcher(name: &str, connector: &RecordingConnector, dest: &std::path::Path, interval: Duration) -> Watcher {
    let fetcher = TransferFetcher::new(connector.clone(), RemotePath::new(ROOT), dest);
    Watcher::new(name, dest, Box::new(fetcher), interval)
}

#[tokio::test]
async fn test_stop_mid_cycle_leaves_no_open_session() {
    let temp = TempDir::new().unwrap();
    let tree = StubTree::with_markers(ROOT)
        .file("a.txt", "a")
        .file("one/b.txt", "b")
        .file("two/c.txt", "c")
        .file("three/d.txt", "d");
    let connector = RecordingConnector::new(tree).with_list_delay(Duration::from_millis(100));
    let dest = temp.path().join("project");

    let mut supervisor = WatcherSupervisor::new();
    supervisor
        .spawn(transfer_watcher("project", &connector, &dest, Duration::from_secs(60)))
        .unwrap();

    wait_until(|| connector.opened() == 1).await;
    let status = supervisor.stop("project").await.unwrap();

    assert_eq!(status.state, WatchState::Stopped);
    assert_eq!(status.last_outcome, Some(FetchOutcome::cancelled()));
    assert_eq!(connector.opened(), 1);
    assert_eq!(connector.closed(), 1);
    assert!(supervisor.is_empty());
}

#[tokio::test]
async fn test_stop_timeout_never_reports_stopped_with_open_session() {
    let temp = TempDir::new().unwrap();
    let tree = StubTree::with_markers(ROOT).file("a.txt", "a");
    let connector = RecordingConnector::new(tree).with_list_delay(Duration::from_millis(400));
    let dest = temp.path().join("project");

    let mut supervisor = WatcherSupervisor::new().with_stop_timeout(Duration::from_millis(20));
    supervisor
        .spawn(transfer_watcher("project", &connector, &dest, Duration::from_secs(60)))
        .unwrap();
    wait_until(|| connector.opened() == 1).await;

    let first = supervisor.stop("project").await;
    assert!(matches!(first, Err(Error::StopTimedOut { ref name, .. }) if name == "project"));
    assert_eq!(supervisor.names(), vec!["project".to_string()]);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let status = loop {
        match supervisor.stop("project").await {
            Ok(status) => break status,
            Err(Error::StopTimedOut { .. }) => {
                assert!(tokio::time::Instant::now() < deadline, "loop never finished");
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    };

    assert_eq!(status.state, WatchState::Stopped);
    assert_eq!(connector.open_sessions(), 0);
    assert_eq!(connector.closed(), 1);
    assert!(supervisor.is_empty());
}

#[tokio::test]
async fn test_shutdown_keeps_unfinished_watchers_supervised() {
    let temp = TempDir::new().unwrap();
    let tree = StubTree::with_markers(ROOT).file("a.txt", "a");
    let connector = RecordingConnector::new(tree).with_list_delay(Duration::from_millis(400));

    let mut supervisor = WatcherSupervisor::new().with_stop_timeout(Duration::from_millis(20));
    supervisor
        .spawn(transfer_watcher("project", &connector, &temp.path().join("project"), Duration::from_secs(60)))
        .unwrap();
    wait_until(|| connector.opened() == 1).await;

    let mut stopped = Vec::new();
    while stopped.is_empty() {
        stopped = supervisor.shutdown().await;
        if stopped.is_empty() {
            assert_eq!(supervisor.len(), 1);
        }
    }

    assert_eq!(stopped[0].state, WatchState::Stopped);
    assert_eq!(connector.open_sessions(), 0);
    assert!(supervisor.is_empty());
}

#[tokio::test]
async fn test_failed_cycle_is_retried_on_next_tick() {
    let temp = TempDir::new().unwrap();
    let connector = RecordingConnector::new(StubTree::with_markers(ROOT).file("a.txt", "a"));
    connector.refuse_connections(true);

    let mut supervisor = WatcherSupervisor::new();
    supervisor
        .spawn(transfer_watcher("project", &connector, &temp.path().join("project"), TICK))
        .unwrap();

    wait_until(|| {
        supervisor
            .status("project")
            .is_some_and(|s| s.state == WatchState::Failed)
    })
    .await;

    connector.refuse_connections(false);
    wait_until(|| {
        supervisor
            .status("project")
            .is_some_and(|s| s.last_outcome == Some(FetchOutcome::Changed))
    })
    .await;

    let status = supervisor.status("project").unwrap();
    assert!(status.cycles >= 2);
    assert!(status.last_checked.is_some());

    supervisor.shutdown().await;
    assert_eq!(connector.open_sessions(), 0);
}

#[tokio::test]
async fn test_changed_outcomes_are_broadcast() {
    let tree = TestTree::new();
    tree.write("one.txt", "1");

    let mut supervisor = WatcherSupervisor::new();
    let mut events = supervisor.subscribe();
    let watcher = Watcher::new("tree", tree.root(), Box::new(LocalDirFetcher::new(tree.root())), TICK);
    supervisor.spawn(watcher).unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.name, "tree");
    assert_eq!(first.cycle, 1);

    tree.write("two.txt", "2");
    let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(second.cycle > first.cycle);
    assert_eq!(second.mirror_path, tree.root());

    let stopped = supervisor.shutdown().await;
    assert_eq!(stopped.len(), 1);
    assert_eq!(stopped[0].state, WatchState::Stopped);
}

#[tokio::test]
async fn test_duplicate_mirror_path_is_rejected() {
    let tree = TestTree::new();
    let mut supervisor = WatcherSupervisor::new();

    let first = Watcher::new("a", tree.root(), Box::new(LocalDirFetcher::new(tree.root())), TICK);
    let second = Watcher::new("b", tree.root(), Box::new(LocalDirFetcher::new(tree.root())), TICK);
    supervisor.spawn(first).unwrap();

    let result = supervisor.spawn(second);

    assert!(matches!(result, Err(Error::DuplicateMirror { ref existing, .. }) if existing == "a"));
    assert_eq!(supervisor.names(), vec!["a".to_string()]);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_stop_unknown_watcher() {
    let mut supervisor = WatcherSupervisor::new();
    assert!(matches!(
        supervisor.stop("nope").await,
        Err(Error::UnknownWatcher { .. })
    ));
}

#[tokio::test]
async fn test_stop_one_keeps_the_others_running() {
    let a = TestTree::new();
    let b = TestTree::new();
    let mut supervisor = WatcherSupervisor::new();
    supervisor
        .spawn(Watcher::new("a", a.root(), Box::new(LocalDirFetcher::new(a.root())), TICK))
        .unwrap();
    supervisor
        .spawn(Watcher::new("b", b.root(), Box::new(LocalDirFetcher::new(b.root())), TICK))
        .unwrap();

    let stopped = supervisor.stop("a").await.unwrap();
    assert_eq!(stopped.state, WatchState::Stopped);

    let before = supervisor.status("b").unwrap().cycles;
    wait_until(|| supervisor.status("b").is_some_and(|s| s.cycles > before)).await;
    assert_ne!(supervisor.status("b").unwrap().state, WatchState::Stopped);

    supervisor.shutdown().await;
}

struct CountingCollaborator {
    calls: AtomicUsize,
}

#[async_trait]
impl Collaborator for CountingCollaborator {
    fn name(&self) -> &str {
        "counting"
    }

    async fn inspect(&self, status: &WatchStatus) -> repo_watch::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} inspected", status.name))
    }
}

#[tokio::test]
async fn test_collaborator_runs_against_synced_mirrors() {
    let tree = TestTree::new();
    tree.write("file.txt", "x");
    let mut supervisor = WatcherSupervisor::new();
    supervisor
        .spawn(Watcher::new("tree", tree.root(), Box::new(LocalDirFetcher::new(tree.root())), TICK))
        .unwrap();
    wait_until(|| supervisor.status("tree").is_some_and(|s| s.last_outcome.is_some())).await;

    let collaborator = CountingCollaborator {
        calls: AtomicUsize::new(0),
    };
    let runs = supervisor.run_collaborator(&collaborator).await;

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].repository, "tree");
    assert_eq!(runs[0].result.as_deref().unwrap(), "tree inspected");
    assert_eq!(collaborator.calls.load(Ordering::SeqCst), 1);
    supervisor.shutdown().await;
}
