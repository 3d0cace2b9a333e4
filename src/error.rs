//! Error types for cpj
//!
//! Setup and traversal errors abort a run before any worker starts. Per-file
//! copy errors are carried back from the workers as [`JobFailure`] records and
//! aggregated instead of aborting the process.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cpj operations
#[derive(Error, Debug)]
pub enum CpjError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path the failing operation touched
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Source is a directory but recursion was not requested
    #[error("Source is a directory, but --recurse was not given: {0}")]
    SourceIsDirectory(PathBuf),

    /// Source is a directory but the destination is not
    #[error("Source is a directory but destination is not: {0}")]
    DestinationNotDirectory(PathBuf),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Directory traversal failed
    #[error("Traversal error at '{path}': {message}")]
    Traversal {
        /// Entry the walker failed on, empty if unknown
        path: PathBuf,
        /// Walker error text
        message: String,
    },

    /// Unsupported file type
    #[error("Unsupported file type at '{path}': {file_type}")]
    UnsupportedFileType {
        /// Offending path
        path: PathBuf,
        /// What was found there instead of a regular file
        file_type: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Worker pool error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Source and destination lists handed to a job queue differ in length
    #[error("Job queue lists differ in length: {sources} sources, {destinations} destinations")]
    JobQueueMismatch {
        /// Length of the source list
        sources: usize,
        /// Length of the destination list
        destinations: usize,
    },
}

impl CpjError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Result type alias for cpj operations
pub type Result<T> = std::result::Result<T, CpjError>;

impl From<walkdir::Error> for CpjError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        CpjError::Traversal {
            path,
            message: err.to_string(),
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| CpjError::io(path, e))
    }
}

/// A single failed copy, as reported by the worker that attempted it
#[derive(Debug)]
pub struct JobFailure {
    /// Worker that claimed the job
    pub worker_id: usize,
    /// Source file
    pub source: PathBuf,
    /// Destination file
    pub destination: PathBuf,
    /// What went wrong
    pub error: CpjError,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.source.display(),
            self.destination.display(),
            self.error
        )
    }
}
