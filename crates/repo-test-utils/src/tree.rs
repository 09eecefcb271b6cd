//! [`TestTree`] builder for local directory sources.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// A temporary directory tree with helpers for writing, re-stamping and
/// asserting on files.
///
/// # Example
///
/// ```rust,no_run
/// use repo_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write("src/main.rs", "fn main() {}");
/// tree.assert_file_exists("src/main.rs");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the tree.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// A `localdir://` URI naming the tree root.
    pub fn uri(&self) -> String {
        format!("localdir://{}", self.root().display())
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let full_path = self.path(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Move the modification time of `relative` forward by `secs`.
    ///
    /// # Panics
    /// Panics if the file does not exist.
    pub fn touch_forward(&self, relative: &str, secs: u64) {
        let full_path = self.path(relative);
        let current = fs::metadata(&full_path)
            .and_then(|m| m.modified())
            .unwrap_or_else(|e| panic!("touch_forward: {}: {e}", full_path.display()));
        File::options()
            .write(true)
            .open(&full_path)
            .and_then(|file| file.set_modified(current + Duration::from_secs(secs)))
            .unwrap_or_else(|e| panic!("touch_forward: {}: {e}", full_path.display()));
    }

    /// Set the modification time of `relative` to a fixed instant.
    pub fn stamp(&self, relative: &str, time: SystemTime) {
        let full_path = self.path(relative);
        File::options()
            .write(true)
            .open(&full_path)
            .and_then(|file| file.set_modified(time))
            .unwrap_or_else(|e| panic!("stamp: {}: {e}", full_path.display()));
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to the root) holds exactly
    /// `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or differs.
    pub fn assert_file_eq(&self, path: &str, content: &str) {
        let full_path = self.path(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert_eq!(
            file_content,
            content,
            "File {} has unexpected content",
            full_path.display()
        );
    }
}
