//! Directory tree enumeration
//!
//! Walks a source tree once to count its files and once more to list them,
//! depth-first in the order the filesystem returns directory entries.
//! No sorting is applied and any walk error aborts the whole scan.

use crate::error::{CpjError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Ordered list of file paths
pub type PathList = Vec<PathBuf>;

/// Result of enumerating a directory tree
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Root path that was scanned
    pub root: PathBuf,
    /// Every non-directory entry, in traversal order
    pub files: PathList,
    /// Number of files found by the counting pass
    pub file_count: usize,
    /// Scan duration
    pub scan_duration: Duration,
}

/// Depth-first enumerator of the files under a directory
#[derive(Debug, Clone, Default)]
pub struct TreeEnumerator {
    follow_links: bool,
}

impl TreeEnumerator {
    /// Create an enumerator that does not follow symbolic links
    pub fn new() -> Self {
        Self::default()
    }

    fn walker(&self, root: &Path) -> WalkDir {
        WalkDir::new(root).follow_links(self.follow_links)
    }

    /// Count the non-directory entries reachable under `root`
    pub fn count_files(&self, root: &Path) -> Result<usize> {
        let mut count = 0usize;
        for entry in self.walker(root) {
            let entry = entry.map_err(CpjError::from)?;
            if !entry.file_type().is_dir() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// List every non-directory entry under `root` in traversal order
    pub fn enumerate(&self, root: &Path) -> Result<ScanResult> {
        let start_time = Instant::now();

        if !root.exists() {
            return Err(CpjError::NotFound(root.to_path_buf()));
        }

        let file_count = self.count_files(root)?;
        tracing::debug!(root = %root.display(), file_count, "counted files");

        let mut files = PathList::with_capacity(file_count);
        for entry in self.walker(root) {
            let entry = entry.map_err(CpjError::from)?;
            if entry.file_type().is_dir() {
                tracing::trace!(path = %entry.path().display(), "found directory");
                continue;
            }
            tracing::trace!(path = %entry.path().display(), "found file");
            files.push(entry.into_path());
        }

        Ok(ScanResult {
            root: root.to_path_buf(),
            files,
            file_count,
            scan_duration: start_time.elapsed(),
        })
    }
}
