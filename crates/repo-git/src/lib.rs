//! Git transport for the repository sync engine
//!
//! [`GitMirror`] keeps a local clone in step with its remote by fetching and
//! hard-resetting to the remote's default branch. [`RefProbe`] lists remote
//! references without writing anything to disk.

pub mod auth;
pub mod error;
pub mod mirror;
pub mod probe;

pub use auth::GitAuth;
pub use error::{Error, Result};
pub use mirror::{GitMirror, SyncResult};
pub use probe::{RefProbe, RemoteRef, format_listing};
