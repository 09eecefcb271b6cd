//! Session abstraction over file-transfer protocols

use std::time::SystemTime;

use crate::Result;

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: Option<u64>, modified: Option<SystemTime>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: None,
            modified: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// An open, authenticated connection to a remote tree.
///
/// Sessions are blocking; async callers run them on a blocking thread.
pub trait RemoteSession {
    /// List the entries of a remote directory, excluding `.` and `..`.
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Fetch the full contents of a remote file.
    fn download(&mut self, path: &str) -> Result<Vec<u8>>;

    /// Close the session. Called exactly once by [`SessionGuard`].
    fn close(&mut self) -> Result<()>;
}

/// Opens sessions against one remote endpoint.
pub trait Connector: Send + Sync {
    type Session: RemoteSession + Send;

    /// Connect and authenticate.
    fn connect(&self) -> Result<Self::Session>;

    /// `host:port` for logging.
    fn endpoint(&self) -> String;
}

/// Owns a session for the length of one cycle and closes it on drop.
///
/// Every exit path out of a cycle, including errors and cancellation,
/// drops the guard.
pub struct SessionGuard<S: RemoteSession> {
    session: Option<S>,
    endpoint: String,
}

impl<S: RemoteSession> SessionGuard<S> {
    pub fn new(session: S, endpoint: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            endpoint: endpoint.into(),
        }
    }

    /// Close now and surface the close error, if any.
    pub fn close(mut self) -> Result<()> {
        match self.session.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        }
    }
}

impl<S: RemoteSession> std::ops::Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        match self.session.as_ref() {
            Some(session) => session,
            None => unreachable!("session taken before guard was dropped"),
        }
    }
}

impl<S: RemoteSession> std::ops::DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        match self.session.as_mut() {
            Some(session) => session,
            None => unreachable!("session taken before guard was dropped"),
        }
    }
}

impl<S: RemoteSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take()
            && let Err(e) = session.close()
        {
            tracing::debug!(endpoint = %self.endpoint, error = %e, "Error while closing session");
        }
    }
}
