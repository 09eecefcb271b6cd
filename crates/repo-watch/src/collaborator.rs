//! Boundary to the external analysis collaborator
//!
//! The engine only ever hands over a mirror path and the latest outcome.
//! Collaborators walk the mirror on their own and never write to it.

use async_trait::async_trait;

use crate::{Result, WatchStatus};

/// Something that consumes mirrors once they are in a usable state.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Inspect one mirror and return a one-line summary.
    async fn inspect(&self, status: &WatchStatus) -> Result<String>;
}

/// The result of one collaborator invocation against one watcher.
#[derive(Debug)]
pub struct CollaboratorRun {
    pub repository: String,
    pub result: Result<String>,
}
