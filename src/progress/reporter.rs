//! Progress reporter implementation
//!
//! Uses indicatif for a file-count bar and a status spinner driven by
//! copy lifecycle events.

use crate::error::JobFailure;
use crate::fs::CopyStats;
use crate::progress::CopyObserver;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress reporter for copy operations
pub struct ProgressReporter {
    /// Multi-progress container
    multi: MultiProgress,
    /// File count progress bar
    files_bar: ProgressBar,
    /// Current status message
    status: ProgressBar,
    /// Start time
    start_time: Instant,
    /// Total files to copy
    total_files: AtomicU64,
    /// Files copied so far
    files_copied: AtomicU64,
    /// Files that failed
    files_failed: AtomicU64,
    /// Bytes copied so far
    bytes_copied: AtomicU64,
    /// Is progress enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let status = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            status.set_style(style);
        }

        let files_bar = multi.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%, ETA {eta})")
        {
            files_bar.set_style(style.progress_chars("=> "));
        }
        files_bar.set_prefix("Files");

        Self {
            multi,
            files_bar,
            status,
            start_time: Instant::now(),
            total_files: AtomicU64::new(0),
            files_copied: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a disabled progress reporter (for quiet mode)
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Set total files to transfer
    pub fn set_total_files(&self, total: u64) {
        self.total_files.store(total, Ordering::Relaxed);
        self.files_bar.set_length(total);
    }

    /// Set current status message
    pub fn set_status(&self, msg: &str) {
        self.status.set_message(msg.to_string());
    }

    fn set_current_file(&self, path: &Path) {
        let path = path.to_string_lossy();
        // Truncate long paths
        let display = match path.char_indices().rev().nth(56) {
            Some((idx, _)) if path.chars().count() > 60 => format!("...{}", &path[idx..]),
            _ => path.into_owned(),
        };
        self.status.set_message(display);
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Get progress summary
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            total_files: self.total_files.load(Ordering::Relaxed),
            files_copied: self.files_copied.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyObserver for ProgressReporter {
    fn scan_complete(&self, _root: &Path, files: usize) {
        self.set_total_files(files as u64);
    }

    fn dispatch_started(&self, _jobs: usize, workers: usize) {
        self.set_status(&format!("Copying with {} workers", workers));
    }

    fn copy_started(&self, _worker_id: usize, source: &Path, _dest: &Path) {
        self.set_current_file(source);
    }

    fn copy_finished(&self, _worker_id: usize, _source: &Path, stats: &CopyStats) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(stats.bytes_copied, Ordering::Relaxed);
        self.files_bar.inc(1);
    }

    fn copy_failed(&self, _failure: &JobFailure, _continuing: bool) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
        self.files_bar.inc(1);
    }

    fn dispatch_finished(&self, failures: usize) {
        if failures == 0 {
            self.status.finish_with_message("✓ Copy complete");
            self.files_bar.finish();
        } else {
            self.status
                .finish_with_message(format!("✗ {} file(s) failed", failures));
            self.files_bar.abandon();
        }
    }
}

/// Progress summary
#[derive(Debug, Clone)]
pub struct ProgressSummary {
    /// Total files to transfer
    pub total_files: u64,
    /// Files copied so far
    pub files_copied: u64,
    /// Files that failed
    pub files_failed: u64,
    /// Bytes copied so far
    pub bytes_copied: u64,
    /// Elapsed time
    pub elapsed: Duration,
}

impl ProgressSummary {
    /// Get completion percentage (failed files count as done)
    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            ((self.files_copied + self.files_failed) as f64 / self.total_files as f64) * 100.0
        }
    }
}
