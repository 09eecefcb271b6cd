//! Shared test utilities for the repository sync workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: git source repositories built with `git2`
//! - [`tree`]: [`TestTree`] builder for local directory sources
//! - [`remote`]: in-memory remote tree and a [`RecordingConnector`] that
//!   counts session open and close calls

pub mod git;
pub mod remote;
pub mod tree;

pub use remote::{RecordingConnector, RecordingSession, StubTree};
pub use tree::TestTree;
