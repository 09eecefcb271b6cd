//! In-memory remote trees and a recording [`Connector`].
//!
//! [`RecordingConnector`] stands in for an FTP or SFTP server. It serves a
//! [`StubTree`] and counts every session it opens and closes so tests can
//! assert that no session outlives its cycle.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

use repo_transfer::{Connector, Error, RemoteEntry, RemoteSession, Result};

/// Timestamp given to files added without an explicit one.
pub const DEFAULT_MTIME_SECS: u64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StubNode {
    Dir,
    File { content: Vec<u8>, modified: SystemTime },
}

/// A remote directory tree held in memory, keyed by absolute remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubTree {
    root: String,
    nodes: BTreeMap<String, StubNode>,
}

impl StubTree {
    /// An empty tree rooted at `root` (for example `/srv/project`).
    pub fn new(root: &str) -> Self {
        let root = root.trim_end_matches('/').to_string();
        let mut nodes = BTreeMap::new();
        nodes.insert(root.clone(), StubNode::Dir);
        Self { root, nodes }
    }

    /// A tree that already carries both marker entries.
    pub fn with_markers(root: &str) -> Self {
        Self::new(root)
            .dir(".git")
            .file(".git/HEAD", "ref: refs/heads/main\n")
            .file(".gitlang", "rust\n")
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn absolute(&self, relative: &str) -> String {
        format!("{}/{}", self.root, relative.trim_matches('/'))
    }

    fn add_parents(&mut self, absolute: &str) {
        let mut current = absolute;
        while let Some((parent, _)) = current.rsplit_once('/') {
            if parent.len() < self.root.len() {
                break;
            }
            self.nodes.entry(parent.to_string()).or_insert(StubNode::Dir);
            current = parent;
        }
    }

    /// Add a directory at `relative`.
    pub fn dir(mut self, relative: &str) -> Self {
        let absolute = self.absolute(relative);
        self.add_parents(&absolute);
        self.nodes.insert(absolute, StubNode::Dir);
        self
    }

    /// Add a file at `relative` with the default timestamp.
    pub fn file(self, relative: &str, content: &str) -> Self {
        self.file_at(relative, content, DEFAULT_MTIME_SECS)
    }

    /// Add a file at `relative` stamped `secs` after the epoch.
    pub fn file_at(mut self, relative: &str, content: &str, secs: u64) -> Self {
        let absolute = self.absolute(relative);
        self.add_parents(&absolute);
        self.nodes.insert(
            absolute,
            StubNode::File {
                content: content.as_bytes().to_vec(),
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            },
        );
        self
    }

    /// Remove `relative` and everything beneath it.
    pub fn remove(mut self, relative: &str) -> Self {
        let absolute = self.absolute(relative);
        let nested = format!("{absolute}/");
        self.nodes
            .retain(|path, _| path != &absolute && !path.starts_with(&nested));
        self
    }

    fn list(&self, path: &str) -> Option<Vec<RemoteEntry>> {
        let path = path.trim_end_matches('/');
        if self.nodes.get(path) != Some(&StubNode::Dir) {
            return None;
        }
        let entries = self
            .nodes
            .iter()
            .filter_map(|(candidate, node)| {
                let (parent, name) = candidate.rsplit_once('/')?;
                if parent != path {
                    return None;
                }
                Some(match node {
                    StubNode::Dir => RemoteEntry::directory(name),
                    StubNode::File { content, modified } => {
                        RemoteEntry::file(name, Some(content.len() as u64), Some(*modified))
                    }
                })
            })
            .collect();
        Some(entries)
    }

    fn read(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.get(path) {
            Some(StubNode::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Shared {
    tree: Mutex<StubTree>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    lists: AtomicUsize,
    list_delay: Mutex<Duration>,
    refuse: AtomicBool,
    drop_after_lists: Mutex<Option<usize>>,
    failing_downloads: Mutex<HashSet<String>>,
}

/// A [`Connector`] serving a [`StubTree`] and recording session lifecycle.
///
/// Clones share the same tree and counters.
#[derive(Debug, Clone)]
pub struct RecordingConnector {
    shared: Arc<Shared>,
}

impl RecordingConnector {
    pub fn new(tree: StubTree) -> Self {
        Self {
            shared: Arc::new(Shared {
                tree: Mutex::new(tree),
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                lists: AtomicUsize::new(0),
                list_delay: Mutex::new(Duration::ZERO),
                refuse: AtomicBool::new(false),
                drop_after_lists: Mutex::new(None),
                failing_downloads: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Sleep this long inside every `list` call, so a cycle stays in
    /// flight long enough to be cancelled.
    pub fn with_list_delay(self, delay: Duration) -> Self {
        *self.shared.list_delay.lock().unwrap() = delay;
        self
    }

    /// Replace the served tree, as if the remote changed between cycles.
    pub fn set_tree(&self, tree: StubTree) {
        *self.shared.tree.lock().unwrap() = tree;
    }

    /// Reject (or accept again) new connections.
    pub fn refuse_connections(&self, refuse: bool) {
        self.shared.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Report a lost connection once `lists` directory listings have been
    /// served in total.
    pub fn drop_connection_after(&self, lists: usize) {
        *self.shared.drop_after_lists.lock().unwrap() = Some(lists);
    }

    /// Make downloads of the absolute remote `path` fail.
    pub fn fail_download(&self, path: &str) {
        self.shared
            .failing_downloads
            .lock()
            .unwrap()
            .insert(path.to_string());
    }

    /// Sessions opened so far.
    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    /// Sessions closed so far.
    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Sessions opened but not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }

    /// Directory listings served so far.
    pub fn lists(&self) -> usize {
        self.shared.lists.load(Ordering::SeqCst)
    }
}

impl Connector for RecordingConnector {
    type Session = RecordingSession;

    fn connect(&self) -> Result<RecordingSession> {
        if self.shared.refuse.load(Ordering::SeqCst) {
            return Err(Error::Connection {
                endpoint: self.endpoint(),
                message: "connection refused".to_string(),
            });
        }
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingSession {
            shared: Arc::clone(&self.shared),
            open: true,
        })
    }

    fn endpoint(&self) -> String {
        "stub.invalid:0".to_string()
    }
}

/// Session handed out by [`RecordingConnector`].
#[derive(Debug)]
pub struct RecordingSession {
    shared: Arc<Shared>,
    open: bool,
}

impl RemoteSession for RecordingSession {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let delay = *self.shared.list_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let served = self.shared.lists.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.shared.drop_after_lists.lock().unwrap()
            && served >= limit
        {
            return Err(Error::Connection {
                endpoint: "stub.invalid:0".to_string(),
                message: "connection reset by peer".to_string(),
            });
        }

        self.shared
            .tree
            .lock()
            .unwrap()
            .list(path)
            .ok_or_else(|| Error::Protocol {
                path: path.to_string(),
                message: "550 No such directory".to_string(),
            })
    }

    fn download(&mut self, path: &str) -> Result<Vec<u8>> {
        if self.shared.failing_downloads.lock().unwrap().contains(path) {
            return Err(Error::Protocol {
                path: path.to_string(),
                message: "550 Permission denied".to_string(),
            });
        }
        self.shared
            .tree
            .lock()
            .unwrap()
            .read(path)
            .ok_or_else(|| Error::Protocol {
                path: path.to_string(),
                message: "550 No such file".to_string(),
            })
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.shared.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
