//! Protocol fetchers
//!
//! Each variant turns one fetch cycle into a [`FetchOutcome`]. Transport
//! errors never escape: they are folded into `Failed` so the owning watch
//! loop keeps running.

mod git;
mod livestream;
mod local;
mod transfer;

use std::time::Duration;

use async_trait::async_trait;
use repo_git::{GitAuth, RemoteRef};
use repo_source::{Credentials, RepoMirror, Scheme, StreamType};
use repo_transfer::{FtpConnector, RemotePath, SftpConnector};
use tokio_util::sync::CancellationToken;

use crate::{Error, FetchOutcome, Result};

pub use git::GitFetcher;
pub use livestream::LivestreamFetcher;
pub use local::LocalDirFetcher;
pub use transfer::TransferFetcher;

/// Poll interval for livestream reference probes.
pub const LIVESTREAM_INTERVAL: Duration = Duration::from_secs(30);

/// Poll interval for mirror refreshes and snapshot comparison.
pub const MIRROR_INTERVAL: Duration = Duration::from_secs(60);

/// Interval used when neither the command line nor the watch list sets one.
pub fn default_interval(stream_type: StreamType) -> Duration {
    match stream_type {
        StreamType::Livestream => LIVESTREAM_INTERVAL,
        StreamType::Offlinestream => MIRROR_INTERVAL,
    }
}

/// One transport's way of keeping a mirror current.
#[async_trait]
pub trait Fetcher: Send {
    /// First cycle for this watcher (clone, first download, baseline).
    async fn initial_fetch(&mut self, cancel: &CancellationToken) -> FetchOutcome;

    /// Every later cycle.
    async fn refresh(&mut self, cancel: &CancellationToken) -> FetchOutcome;

    /// Latest reference listing, for fetchers that probe one.
    fn remote_refs(&self) -> Option<&[RemoteRef]> {
        None
    }

    /// Short variant name for logs and status output.
    fn kind(&self) -> &'static str;
}

/// The closed set of fetch strategies, chosen once per source.
pub enum ProtocolFetcher {
    Git(GitFetcher),
    Livestream(LivestreamFetcher),
    Ftp(TransferFetcher<FtpConnector>),
    Scp(TransferFetcher<SftpConnector>),
    LocalDir(LocalDirFetcher),
}

impl ProtocolFetcher {
    /// Pick the variant for `mirror`'s scheme and `stream_type`.
    ///
    /// Fails for combinations that can never work: livestream on a
    /// non-git scheme, an SFTP source without a username, or a remote
    /// without a host.
    pub fn for_source(mirror: &RepoMirror, stream_type: StreamType) -> Result<Self> {
        let descriptor = mirror.descriptor();
        let scheme = descriptor.scheme();
        let credentials = descriptor.credentials().cloned();

        if stream_type == StreamType::Livestream && !scheme.is_git() {
            return Err(Error::LivestreamUnsupported {
                uri: descriptor.as_str().to_string(),
                scheme: scheme.to_string(),
            });
        }

        let fetcher = match scheme {
            Scheme::GitHttp | Scheme::GitHttps => {
                let auth = credentials.and_then(git_auth);
                match stream_type {
                    StreamType::Livestream => Self::Livestream(LivestreamFetcher::new(
                        descriptor.remote_url(),
                        auth,
                    )),
                    StreamType::Offlinestream => Self::Git(GitFetcher::new(
                        descriptor.remote_url(),
                        mirror.local_path(),
                        auth,
                    )),
                }
            }
            Scheme::Ftp => {
                let (username, password) = split(credentials);
                let connector = FtpConnector::new(
                    host(mirror)?,
                    descriptor.effective_port().unwrap_or(21),
                    username,
                    password,
                );
                Self::Ftp(TransferFetcher::new(
                    connector,
                    RemotePath::new(descriptor.remote_root()),
                    mirror.local_path(),
                ))
            }
            Scheme::Scp => {
                let (username, password) = split(credentials);
                let connector = SftpConnector::new(
                    host(mirror)?,
                    descriptor.effective_port().unwrap_or(22),
                    username,
                    password,
                )
                .map_err(|_| Error::MissingUsername {
                    uri: descriptor.as_str().to_string(),
                })?;
                Self::Scp(TransferFetcher::new(
                    connector,
                    RemotePath::new(descriptor.remote_root()),
                    mirror.local_path(),
                ))
            }
            Scheme::LocalDir => Self::LocalDir(LocalDirFetcher::new(mirror.local_path())),
        };

        tracing::debug!(repo = %mirror.name(), kind = fetcher.kind(), "Fetcher selected");
        Ok(fetcher)
    }
}

fn host(mirror: &RepoMirror) -> Result<String> {
    mirror
        .descriptor()
        .host()
        .map(str::to_string)
        .ok_or_else(|| Error::MissingHost {
            uri: mirror.descriptor().as_str().to_string(),
        })
}

fn split(credentials: Option<Credentials>) -> (Option<String>, Option<String>) {
    match credentials {
        Some(c) => (c.username, c.password),
        None => (None, None),
    }
}

fn git_auth(credentials: Credentials) -> Option<GitAuth> {
    credentials.username.map(|username| GitAuth {
        username,
        password: credentials.password,
    })
}

#[async_trait]
impl Fetcher for ProtocolFetcher {
    async fn initial_fetch(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        match self {
            Self::Git(f) => f.initial_fetch(cancel).await,
            Self::Livestream(f) => f.initial_fetch(cancel).await,
            Self::Ftp(f) => f.initial_fetch(cancel).await,
            Self::Scp(f) => f.initial_fetch(cancel).await,
            Self::LocalDir(f) => f.initial_fetch(cancel).await,
        }
    }

    async fn refresh(&mut self, cancel: &CancellationToken) -> FetchOutcome {
        match self {
            Self::Git(f) => f.refresh(cancel).await,
            Self::Livestream(f) => f.refresh(cancel).await,
            Self::Ftp(f) => f.refresh(cancel).await,
            Self::Scp(f) => f.refresh(cancel).await,
            Self::LocalDir(f) => f.refresh(cancel).await,
        }
    }

    fn remote_refs(&self) -> Option<&[RemoteRef]> {
        match self {
            Self::Livestream(f) => f.remote_refs(),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Git(f) => f.kind(),
            Self::Livestream(f) => f.kind(),
            Self::Ftp(_) => "ftp",
            Self::Scp(_) => "sftp",
            Self::LocalDir(f) => f.kind(),
        }
    }
}

/// Run blocking work on the blocking pool and wait for it.
///
/// The handle is always awaited so anything the job opened is released
/// before the cycle ends.
pub(crate) async fn run_blocking<T, F>(job: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| format!("fetch task failed: {e}"))
}
