//! Single-file copy and path resolution
//!
//! The copy primitive either hard links the destination to the source or
//! streams the contents through a buffered reader/writer.

use crate::error::{CpjError, IoResultExt, Result};
use std::fs::{File, Metadata};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How a file ended up at its destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyMethod {
    /// Contents streamed through a buffer
    #[default]
    Copied,
    /// Destination hard linked to the source
    HardLinked,
    /// Source and destination already are the same file
    Unchanged,
}

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes written to the destination (zero for links)
    pub bytes_copied: u64,
    /// Duration of the copy
    pub duration: Duration,
    /// Method used for copy
    pub method: CopyMethod,
}

/// Duplicates one file. Implementations must be safe to share between workers.
pub trait CopyPrimitive: Send + Sync {
    /// Copy `source` to `dest`, hard linking instead when `hardlink` is set
    fn copy(&self, source: &Path, dest: &Path, hardlink: bool) -> Result<CopyStats>;
}

/// Options for file copy operations
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Buffer size for buffered operations
    pub buffer_size: usize,
    /// Sync to disk after copy
    pub sync: bool,
    /// Create missing parent directories of the destination
    pub create_parents: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1024 * 1024, // 1MB
            sync: true,
            create_parents: true,
        }
    }
}

/// Local filesystem copier
#[derive(Debug, Clone, Default)]
pub struct FileCopier {
    options: CopyOptions,
}

impl FileCopier {
    /// Create a new copier with options
    pub fn new(options: CopyOptions) -> Self {
        Self { options }
    }

    /// Create a copier with default options
    pub fn default_copier() -> Self {
        Self::default()
    }

    fn copy_contents(&self, source: &Path, dest: &Path) -> Result<u64> {
        let src = File::open(source).with_path(source)?;
        let dst = File::create(dest).with_path(dest)?;

        let mut reader = BufReader::with_capacity(self.options.buffer_size, src);
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, dst);

        let bytes = std::io::copy(&mut reader, &mut writer).with_path(dest)?;
        writer.flush().with_path(dest)?;

        if self.options.sync {
            writer.get_ref().sync_all().with_path(dest)?;
        }

        Ok(bytes)
    }
}

impl CopyPrimitive for FileCopier {
    fn copy(&self, source: &Path, dest: &Path, hardlink: bool) -> Result<CopyStats> {
        let start = Instant::now();

        let src_meta = std::fs::metadata(source).with_path(source)?;
        if !src_meta.is_file() {
            return Err(CpjError::UnsupportedFileType {
                path: source.to_path_buf(),
                file_type: describe(&src_meta).to_string(),
            });
        }

        match std::fs::metadata(dest) {
            Ok(dst_meta) => {
                if !dst_meta.is_file() {
                    return Err(CpjError::UnsupportedFileType {
                        path: dest.to_path_buf(),
                        file_type: describe(&dst_meta).to_string(),
                    });
                }
                if same_file(&src_meta, &dst_meta) {
                    return Ok(CopyStats {
                        bytes_copied: 0,
                        duration: start.elapsed(),
                        method: CopyMethod::Unchanged,
                    });
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.options.create_parents {
                    if let Some(parent) = dest.parent() {
                        std::fs::create_dir_all(parent).with_path(parent)?;
                    }
                }
            }
            Err(e) => return Err(CpjError::io(dest, e)),
        }

        if hardlink {
            match std::fs::hard_link(source, dest) {
                Ok(()) => {
                    return Ok(CopyStats {
                        bytes_copied: 0,
                        duration: start.elapsed(),
                        method: CopyMethod::HardLinked,
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        source = %source.display(),
                        dest = %dest.display(),
                        error = %e,
                        "hard link failed, copying contents"
                    );
                }
            }
        }

        let bytes_copied = self.copy_contents(source, dest)?;

        Ok(CopyStats {
            bytes_copied,
            duration: start.elapsed(),
            method: CopyMethod::Copied,
        })
    }
}

fn describe(meta: &Metadata) -> &'static str {
    let file_type = meta.file_type();
    if file_type.is_dir() {
        "directory"
    } else if file_type.is_symlink() {
        "symlink"
    } else {
        "non-regular file"
    }
}

#[cfg(unix)]
fn same_file(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(_a: &Metadata, _b: &Metadata) -> bool {
    false
}

/// Resolve a path to its canonical absolute form
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CpjError::NotFound(path.to_path_buf())
        } else {
            CpjError::io(path, e)
        }
    })
}
