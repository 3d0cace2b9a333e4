//! Source to destination path mapping
//!
//! `destination[i] = dest_root + (source[i] - source_root)`, with both roots
//! normalized to exactly one trailing separator first.

use crate::error::{CpjError, Result};
use crate::fs::PathList;
use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};

/// Normalize a root so it ends with exactly one separator
pub fn with_trailing_separator(root: &Path) -> PathBuf {
    let normalized: PathBuf = root.components().collect();
    let mut raw: OsString = normalized.into_os_string();
    if !raw.to_string_lossy().ends_with(MAIN_SEPARATOR) {
        raw.push(MAIN_SEPARATOR_STR);
    }
    PathBuf::from(raw)
}

/// Maps paths under a source root onto a destination root
#[derive(Debug, Clone)]
pub struct PathMapper {
    source_root: PathBuf,
    dest_root: PathBuf,
}

impl PathMapper {
    /// Create a mapper between two roots
    pub fn new(source_root: &Path, dest_root: &Path) -> Self {
        let source_root = with_trailing_separator(source_root);
        let dest_root = with_trailing_separator(dest_root);
        tracing::debug!(
            source_root = %source_root.display(),
            dest_root = %dest_root.display(),
            "normalized roots"
        );
        Self {
            source_root,
            dest_root,
        }
    }

    /// Normalized source root
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Normalized destination root
    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Map a single source path
    pub fn map(&self, source: &Path) -> Result<PathBuf> {
        let relative = source.strip_prefix(&self.source_root).map_err(|_| {
            CpjError::InvalidPath(format!(
                "'{}' is not under '{}'",
                source.display(),
                self.source_root.display()
            ))
        })?;
        Ok(self.dest_root.join(relative))
    }

    /// Map a whole list, preserving order and length
    pub fn map_all(&self, sources: &[PathBuf]) -> Result<PathList> {
        let mut destinations = PathList::with_capacity(sources.len());
        for source in sources {
            destinations.push(self.map(source)?);
        }
        Ok(destinations)
    }
}
