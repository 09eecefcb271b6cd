//! Filesystem layer for the repository sync engine
//!
//! Owns the cache root layout, directory snapshots used for change
//! detection, atomic writes into mirrors and watch-list loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod snapshot;

pub use config::{ConfigStore, RepositoryEntry, WatchList};
pub use constants::{GITROOT_ENV, RepoPath};
pub use error::{Error, Result};
pub use layout::{GitrootMode, RootSet, default_cache_base};
pub use snapshot::DirectorySnapshot;
