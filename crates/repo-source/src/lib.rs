//! Source descriptors for the repository sync engine
//!
//! Parses and validates source URIs ([`UriDescriptor`]) and derives the
//! local mirror location for each ([`RepoMirror`]).

pub mod error;
pub mod mirror;
pub mod stream;
pub mod uri;

pub use error::{Error, Result};
pub use mirror::RepoMirror;
pub use stream::StreamType;
pub use uri::{Credentials, Scheme, UriDescriptor};
