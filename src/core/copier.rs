//! Main copy engine
//!
//! Resolves the operands, then either performs a single direct copy or
//! enumerates the source tree, maps it onto the destination and hands the
//! resulting job list to the worker pool.

use crate::config::CopyConfig;
use crate::core::{DispatchResult, Dispatcher, WorkerPolicy};
use crate::error::{CpjError, IoResultExt, JobFailure, Result};
use crate::fs::{absolute_path, CopyPrimitive, FileCopier, PathMapper, TreeEnumerator};
use crate::progress::{CopyObserver, NoopObserver};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What kind of copy was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    /// One file, no worker pool
    Single,
    /// A directory tree through the worker pool
    Tree,
}

/// Copy operation result
#[derive(Debug)]
pub struct CopyResult {
    /// Single file or tree
    pub mode: CopyMode,
    /// Files found in the source
    pub files_total: u64,
    /// Files copied successfully
    pub files_copied: u64,
    /// Bytes written
    pub bytes_copied: u64,
    /// Jobs a worker attempted
    pub jobs_claimed: u64,
    /// Jobs left in the queue when every worker had stopped
    pub jobs_unclaimed: usize,
    /// Workers started
    pub workers: usize,
    /// Failed copies
    pub failures: Vec<JobFailure>,
    /// Worker pool errors
    pub pool_errors: Vec<CpjError>,
    /// Total duration
    pub duration: Duration,
}

impl CopyResult {
    fn from_dispatch(files_total: u64, dispatch: DispatchResult, duration: Duration) -> Self {
        Self {
            mode: CopyMode::Tree,
            files_total,
            files_copied: dispatch.files_copied,
            bytes_copied: dispatch.bytes_copied,
            jobs_claimed: dispatch.jobs_claimed,
            jobs_unclaimed: dispatch.jobs_unclaimed,
            workers: dispatch.workers,
            failures: dispatch.failures,
            pool_errors: dispatch.pool_errors,
            duration,
        }
    }

    /// Check if the copy was completely successful
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.pool_errors.is_empty()
    }

    /// Serializable statistics
    pub fn summary(&self) -> CopySummary {
        let throughput = if self.duration.as_secs_f64() > 0.0 {
            self.bytes_copied as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        };

        CopySummary {
            mode: self.mode,
            files_total: self.files_total,
            files_copied: self.files_copied,
            files_failed: self.failures.len() as u64,
            bytes_copied: self.bytes_copied,
            files_skipped: self.jobs_unclaimed as u64,
            workers: self.workers,
            duration: humantime::format_duration(round_to_millis(self.duration)).to_string(),
            throughput_bytes_per_sec: throughput,
            errors: self
                .failures
                .iter()
                .map(ToString::to_string)
                .chain(self.pool_errors.iter().map(ToString::to_string))
                .collect(),
        }
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        let summary = self.summary();

        println!("\n=== Copy Summary ===");
        println!("Files found:     {}", summary.files_total);
        println!("Files copied:    {}", summary.files_copied);
        if summary.files_skipped > 0 {
            println!("Files skipped:   {}", summary.files_skipped);
        }
        println!("Bytes copied:    {}", humansize::format_size(summary.bytes_copied, humansize::BINARY));
        println!("Workers:         {}", summary.workers);
        println!("Duration:        {}", summary.duration);
        println!(
            "Throughput:      {}/s",
            humansize::format_size(summary.throughput_bytes_per_sec as u64, humansize::BINARY)
        );

        if !summary.errors.is_empty() {
            println!("\nFailures: {}", summary.errors.len());
            for error in &summary.errors {
                println!("  {}", error);
            }
        }
    }
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}

/// Statistics report, as printed with `--useful`
#[derive(Debug, Clone, Serialize)]
pub struct CopySummary {
    /// Single file or tree
    pub mode: CopyMode,
    /// Files found in the source
    pub files_total: u64,
    /// Files copied successfully
    pub files_copied: u64,
    /// Files that failed
    pub files_failed: u64,
    /// Bytes written
    pub bytes_copied: u64,
    /// Files never attempted because workers stopped at their first error
    pub files_skipped: u64,
    /// Workers started
    pub workers: usize,
    /// Human-readable duration
    pub duration: String,
    /// Average throughput
    pub throughput_bytes_per_sec: f64,
    /// One line per error
    pub errors: Vec<String>,
}

/// Main copy engine
pub struct CopyEngine {
    /// Configuration
    config: CopyConfig,
    /// File copy primitive
    copier: Arc<dyn CopyPrimitive>,
    /// Event sink
    observer: Arc<dyn CopyObserver>,
}

impl CopyEngine {
    /// Create a new copy engine
    pub fn new(config: CopyConfig) -> Self {
        Self {
            config,
            copier: Arc::new(FileCopier::default_copier()),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Use a different copy primitive
    pub fn with_copier(mut self, copier: Arc<dyn CopyPrimitive>) -> Self {
        self.copier = copier;
        self
    }

    /// Report events to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn CopyObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Execute the copy operation
    pub fn execute(&self) -> Result<CopyResult> {
        let start_time = Instant::now();

        let source = absolute_path(&self.config.source)?;
        let source_meta = std::fs::symlink_metadata(&source).with_path(&source)?;

        if !source_meta.is_dir() {
            return self.copy_single(&source, start_time);
        }
        if !self.config.recurse {
            return Err(CpjError::SourceIsDirectory(source));
        }

        let destination = absolute_path(&self.config.destination)?;
        let dest_meta = std::fs::symlink_metadata(&destination).with_path(&destination)?;
        if !dest_meta.is_dir() {
            return Err(CpjError::DestinationNotDirectory(destination));
        }

        let scan = TreeEnumerator::new().enumerate(&source)?;
        self.observer.scan_complete(&scan.root, scan.file_count);
        tracing::info!(files = scan.files.len(), "Number of files to be copied: {}", scan.files.len());

        let mapper = PathMapper::new(&source, &destination);
        let destinations = mapper.map_all(&scan.files)?;
        for (src, dst) in scan.files.iter().zip(&destinations) {
            tracing::trace!(source = %src.display(), dest = %dst.display(), "job");
        }

        let files_total = scan.files.len() as u64;
        let dispatcher = Dispatcher::new(
            self.config.effective_jobs(),
            WorkerPolicy {
                hardlink: self.config.hardlink,
                continue_on_error: self.config.continue_on_error,
            },
        )
        .with_copier(Arc::clone(&self.copier))
        .with_observer(Arc::clone(&self.observer));

        let dispatch = dispatcher.dispatch_lists(scan.files, destinations)?;

        Ok(CopyResult::from_dispatch(files_total, dispatch, start_time.elapsed()))
    }

    /// Copy a non-directory source directly, without a worker pool
    fn copy_single(&self, source: &Path, start_time: Instant) -> Result<CopyResult> {
        let destination = &self.config.destination;
        tracing::debug!(
            source = %source.display(),
            dest = %destination.display(),
            "source is not a directory, copying directly"
        );

        self.observer.copy_started(0, source, destination);
        let stats = self.copier.copy(source, destination, self.config.hardlink)?;
        self.observer.copy_finished(0, source, &stats);

        Ok(CopyResult {
            mode: CopyMode::Single,
            files_total: 1,
            files_copied: 1,
            bytes_copied: stats.bytes_copied,
            jobs_claimed: 1,
            jobs_unclaimed: 0,
            workers: 0,
            failures: Vec::new(),
            pool_errors: Vec::new(),
            duration: start_time.elapsed(),
        })
    }
}

/// Recursively copy `source` into the existing directory `dest` with `jobs` workers
pub fn parallel_copy(source: &Path, dest: &Path, jobs: usize) -> Result<CopyResult> {
    let config = CopyConfig {
        source: source.to_path_buf(),
        destination: dest.to_path_buf(),
        recurse: true,
        jobs,
        ..Default::default()
    };

    CopyEngine::new(config).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::CopyStats;
    use std::collections::BTreeMap;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().write_all(contents).unwrap();
    }

    fn create_five_files(dir: &Path) {
        write_file(&dir.join("one.txt"), b"one");
        write_file(&dir.join("two.txt"), b"two");
        write_file(&dir.join("sub/three.txt"), b"three");
        write_file(&dir.join("sub/unreadable.txt"), b"secret");
        write_file(&dir.join("sub/deep/five.txt"), b"five");
    }

    /// Relative path to contents for every file under `root`
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        TreeEnumerator::new()
            .enumerate(root)
            .unwrap()
            .files
            .into_iter()
            .map(|path| {
                let contents = std::fs::read(&path).unwrap();
                (path.strip_prefix(root).unwrap().to_path_buf(), contents)
            })
            .collect()
    }

    /// Delegates to the real copier but refuses one file name
    struct FailingCopier {
        fail_name: &'static str,
        inner: FileCopier,
    }

    impl FailingCopier {
        fn new(fail_name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                fail_name,
                inner: FileCopier::default_copier(),
            })
        }
    }

    impl CopyPrimitive for FailingCopier {
        fn copy(&self, source: &Path, dest: &Path, hardlink: bool) -> Result<CopyStats> {
            if source.file_name().map(|n| n == self.fail_name).unwrap_or(false) {
                return Err(CpjError::io(
                    source,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
                ));
            }
            self.inner.copy(source, dest, hardlink)
        }
    }

    fn tree_config(src: &Path, dst: &Path, jobs: usize, continue_on_error: bool) -> CopyConfig {
        CopyConfig {
            source: src.to_path_buf(),
            destination: dst.to_path_buf(),
            recurse: true,
            jobs,
            continue_on_error,
            ..Default::default()
        }
    }

    #[test]
    fn test_tree_copy() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("x.txt"), b"x contents");
        write_file(&src.path().join("sub/y.txt"), b"y contents");

        let result = parallel_copy(src.path(), dst.path(), 2).unwrap();

        assert!(result.is_success());
        assert_eq!(result.mode, CopyMode::Tree);
        assert_eq!(result.files_total, 2);
        assert_eq!(result.files_copied, 2);
        assert_eq!(result.workers, 2);
        assert_eq!(std::fs::read(dst.path().join("x.txt")).unwrap(), b"x contents");
        assert_eq!(std::fs::read(dst.path().join("sub/y.txt")).unwrap(), b"y contents");
    }

    #[test]
    fn test_single_file_copy() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("x.txt");
        let dest = dst.path().join("x.txt");
        write_file(&source, b"just one file");

        let config = CopyConfig {
            source: source.clone(),
            destination: dest.clone(),
            jobs: 4,
            ..Default::default()
        };
        let result = CopyEngine::new(config).execute().unwrap();

        assert_eq!(result.mode, CopyMode::Single);
        assert_eq!(result.workers, 0);
        assert_eq!(std::fs::read(&dest).unwrap(), b"just one file");
    }

    #[test]
    fn test_directory_without_recurse_fails() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("x.txt"), b"x");

        let config = CopyConfig {
            source: src.path().to_path_buf(),
            destination: dst.path().to_path_buf(),
            ..Default::default()
        };
        let err = CopyEngine::new(config).execute().unwrap_err();

        assert!(matches!(err, CpjError::SourceIsDirectory(_)));
        assert_eq!(std::fs::read_dir(dst.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_destination_must_be_directory() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("x.txt"), b"x");
        let not_a_dir = dst.path().join("file");
        write_file(&not_a_dir, b"occupied");

        let err = parallel_copy(src.path(), &not_a_dir, 2).unwrap_err();
        assert!(matches!(err, CpjError::DestinationNotDirectory(_)));
    }

    #[test]
    fn test_missing_destination_fails_setup() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("x.txt"), b"x");

        let err = parallel_copy(src.path(), &dst.path().join("missing"), 2).unwrap_err();
        assert!(matches!(err, CpjError::NotFound(_)));
    }

    #[test]
    fn test_missing_source_fails_setup() {
        let dst = TempDir::new().unwrap();
        let err = parallel_copy(&dst.path().join("nope"), dst.path(), 1).unwrap_err();
        assert!(matches!(err, CpjError::NotFound(_)));
    }

    #[test]
    fn test_empty_tree() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("only-a-dir")).unwrap();

        let result = parallel_copy(src.path(), dst.path(), 4).unwrap();

        assert!(result.is_success());
        assert_eq!(result.workers, 0);
        assert_eq!(result.files_total, 0);
    }

    #[test]
    fn test_copy_twice_is_identical() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_five_files(src.path());

        parallel_copy(src.path(), dst.path(), 3).unwrap();
        let first = snapshot(dst.path());
        let result = parallel_copy(src.path(), dst.path(), 3).unwrap();
        let second = snapshot(dst.path());

        assert!(result.is_success());
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert_eq!(second, snapshot(src.path()));
    }

    #[test]
    fn test_one_unreadable_file_with_continue() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_five_files(src.path());

        let engine = CopyEngine::new(tree_config(src.path(), dst.path(), 3, true))
            .with_copier(FailingCopier::new("unreadable.txt"));
        let result = engine.execute().unwrap();

        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].source.ends_with("sub/unreadable.txt"));
        assert_eq!(result.files_copied, 4);
        for name in ["one.txt", "two.txt", "sub/three.txt", "sub/deep/five.txt"] {
            assert!(dst.path().join(name).exists(), "{} missing", name);
        }
        assert!(!dst.path().join("sub/unreadable.txt").exists());
    }

    #[test]
    fn test_one_unreadable_file_without_continue_terminates() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_five_files(src.path());

        let engine = CopyEngine::new(tree_config(src.path(), dst.path(), 1, false))
            .with_copier(FailingCopier::new("unreadable.txt"));
        let result = engine.execute().unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.files_copied + 1 + result.jobs_unclaimed as u64, 5);
        assert_eq!(result.jobs_claimed, result.files_copied + 1);
        assert_eq!(result.summary().files_skipped, result.jobs_unclaimed as u64);
        assert!(!result.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_file_with_continue() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_five_files(src.path());
        let locked = src.path().join("sub/unreadable.txt");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root can read anything, so the failure cannot be provoked
        if File::open(&locked).is_ok() {
            return;
        }

        let result = parallel_copy_with(src.path(), dst.path(), 3, true);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o644)).unwrap();

        let result = result.unwrap();
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.is_permission_error());
        assert_eq!(result.files_copied, 4);
    }

    #[cfg(unix)]
    fn parallel_copy_with(src: &Path, dst: &Path, jobs: usize, continue_on_error: bool) -> Result<CopyResult> {
        CopyEngine::new(tree_config(src, dst, jobs, continue_on_error)).execute()
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_hardlink() {
        use std::os::unix::fs::MetadataExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("sub/a.txt"), b"a");

        let config = CopyConfig {
            hardlink: true,
            ..tree_config(src.path(), dst.path(), 2, false)
        };
        let result = CopyEngine::new(config).execute().unwrap();

        assert!(result.is_success());
        assert_eq!(
            std::fs::metadata(src.path().join("sub/a.txt")).unwrap().ino(),
            std::fs::metadata(dst.path().join("sub/a.txt")).unwrap().ino()
        );
    }

    #[test]
    fn test_trailing_separator_on_roots() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("a/b.txt"), b"b");

        let mut src_root = src.path().as_os_str().to_os_string();
        src_root.push("/");
        let result = parallel_copy(&PathBuf::from(src_root), dst.path(), 1).unwrap();

        assert!(result.is_success());
        assert!(dst.path().join("a/b.txt").exists());
    }

    #[test]
    fn test_summary_serializes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_file(&src.path().join("x.txt"), b"12345");

        let result = parallel_copy(src.path(), dst.path(), 1).unwrap();
        let json = serde_json::to_value(result.summary()).unwrap();

        assert_eq!(json["mode"], "tree");
        assert_eq!(json["files_copied"], 1);
        assert_eq!(json["bytes_copied"], 5);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
