//! Watch loops for the repository sync engine
//!
//! A [`Watcher`] drives one [`Fetcher`] on a fixed interval and publishes
//! every outcome. The [`WatcherSupervisor`] runs many watchers side by
//! side, each behind its own cancellation token, and is the surface a
//! [`Collaborator`] talks to.
//!
//! Fetch dispatch is decided once per source by
//! [`ProtocolFetcher::for_source`]:
//!
//! | Scheme | Stream type | Variant |
//! |---|---|---|
//! | `http`, `https` | offlinestream | [`GitFetcher`] (clone, then fetch + hard reset) |
//! | `http`, `https` | livestream | [`LivestreamFetcher`] (reference probe, no writes) |
//! | `ftp` | offlinestream | [`TransferFetcher`] over FTP |
//! | `scp` | offlinestream | [`TransferFetcher`] over SFTP |
//! | `localdir` | offlinestream | [`LocalDirFetcher`] (snapshot comparison) |

pub mod collaborator;
pub mod error;
pub mod fetcher;
pub mod outcome;
pub mod supervisor;
pub mod watcher;

pub use collaborator::{Collaborator, CollaboratorRun};
pub use error::{Error, Result};
pub use fetcher::{
    Fetcher, GitFetcher, LivestreamFetcher, LocalDirFetcher, ProtocolFetcher, TransferFetcher,
    default_interval,
};
pub use outcome::FetchOutcome;
pub use supervisor::WatcherSupervisor;
pub use watcher::{MirrorEvent, WatchState, WatchStatus, Watcher};
