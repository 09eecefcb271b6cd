//! Recursive tree mirroring over file-transfer protocols
//!
//! A [`Connector`] opens a [`RemoteSession`]; [`sync_tree`] holds that
//! session in a [`SessionGuard`] for one whole cycle, checks the marker
//! entries, downloads the tree and always closes the session on the way
//! out.

pub mod error;
pub mod ftp;
pub mod manifest;
pub mod remote_path;
pub mod session;
pub mod sftp;
pub mod tree;

pub use error::{Error, Result};
pub use ftp::{FtpConnector, FtpSession};
pub use manifest::{FileStamp, RemoteManifest};
pub use remote_path::RemotePath;
pub use session::{Connector, EntryKind, RemoteEntry, RemoteSession, SessionGuard};
pub use sftp::{SftpConnector, SftpSession};
pub use tree::{TransferReport, check_markers, mirror_tree, sync_tree};
