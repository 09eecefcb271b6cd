//! Built-in stand-in for the analysis collaborator

use async_trait::async_trait;
use repo_watch::{Collaborator, Error, WatchStatus};
use walkdir::WalkDir;

/// Counts what a mirror holds without reading any file.
///
/// Version-control metadata directories are not counted.
#[derive(Debug, Default)]
pub struct TreeSummaryCollaborator;

#[async_trait]
impl Collaborator for TreeSummaryCollaborator {
    fn name(&self) -> &str {
        "tree-summary"
    }

    async fn inspect(&self, status: &WatchStatus) -> repo_watch::Result<String> {
        if !status.refs.is_empty() {
            return Ok(format!("{} remote references", status.refs.len()));
        }

        let root = status.mirror_path.clone();
        let name = status.name.clone();
        let counted = tokio::task::spawn_blocking(move || summarize(&root))
            .await
            .map_err(|e| Error::Collaborator {
                name: name.clone(),
                message: e.to_string(),
            })?;

        let (files, dirs) = counted.map_err(|message| Error::Collaborator { name, message })?;
        tracing::info!(repo = %status.name, files, dirs, "Mirror summarised");
        Ok(format!("{files} files in {dirs} directories"))
    }
}

fn summarize(root: &std::path::Path) -> Result<(usize, usize), String> {
    let mut files = 0;
    let mut dirs = 0;
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(|e| e.to_string())?;
        if entry.file_type().is_dir() {
            dirs += 1;
        } else if entry.file_type().is_file() {
            files += 1;
        }
    }
    Ok((files, dirs))
}
