//! Copy lifecycle events
//!
//! The engine, the dispatcher and every worker report through an injected
//! [`CopyObserver`] instead of consulting process-wide flags.

use crate::error::JobFailure;
use crate::fs::CopyStats;
use std::path::Path;
use std::sync::Arc;

/// Receiver of copy lifecycle events. Every method defaults to a no-op.
pub trait CopyObserver: Send + Sync {
    /// The source tree was enumerated
    fn scan_complete(&self, _root: &Path, _files: usize) {}

    /// The worker pool is about to start
    fn dispatch_started(&self, _jobs: usize, _workers: usize) {}

    /// A worker thread began running
    fn worker_started(&self, _worker_id: usize) {}

    /// A worker claimed a job and is about to copy it
    fn copy_started(&self, _worker_id: usize, _source: &Path, _dest: &Path) {}

    /// A copy succeeded
    fn copy_finished(&self, _worker_id: usize, _source: &Path, _stats: &CopyStats) {}

    /// A copy failure reached the aggregator
    fn copy_failed(&self, _failure: &JobFailure, _continuing: bool) {}

    /// A worker's terminal outcome reached the aggregator
    fn worker_finished(&self, _worker_id: usize, _remaining: usize) {}

    /// Every worker has terminated
    fn dispatch_finished(&self, _failures: usize) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CopyObserver for NoopObserver {}

/// Observer that writes events to `tracing`
///
/// Copy attempts and failures are logged at `info` only when verbose;
/// pool lifecycle goes to `debug` and is left to the subscriber filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver {
    verbose: bool,
}

impl TracingObserver {
    /// Create a tracing observer
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CopyObserver for TracingObserver {
    fn scan_complete(&self, root: &Path, files: usize) {
        tracing::debug!(root = %root.display(), files, "scan complete");
    }

    fn dispatch_started(&self, jobs: usize, workers: usize) {
        tracing::debug!(jobs, workers, "starting workers");
    }

    fn worker_started(&self, worker_id: usize) {
        tracing::debug!(worker_id, "worker started");
    }

    fn copy_started(&self, worker_id: usize, source: &Path, dest: &Path) {
        if self.verbose {
            tracing::info!(
                worker_id,
                "Copying {} to {}",
                source.display(),
                dest.display()
            );
        }
    }

    fn copy_finished(&self, worker_id: usize, source: &Path, stats: &CopyStats) {
        tracing::trace!(
            worker_id,
            source = %source.display(),
            bytes = stats.bytes_copied,
            method = ?stats.method,
            "copy finished"
        );
    }

    fn copy_failed(&self, failure: &JobFailure, continuing: bool) {
        if self.verbose {
            tracing::info!(
                worker_id = failure.worker_id,
                continuing,
                permission_denied = failure.error.is_permission_error(),
                "Error: {}",
                failure
            );
        }
    }

    fn worker_finished(&self, worker_id: usize, remaining: usize) {
        tracing::debug!(worker_id, remaining, "worker finished");
    }

    fn dispatch_finished(&self, failures: usize) {
        tracing::debug!(failures, "all workers finished");
    }
}

/// Fans events out to several observers
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn CopyObserver>>,
}

impl ObserverSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer
    pub fn with(mut self, observer: Arc<dyn CopyObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of observers in the set
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl CopyObserver for ObserverSet {
    fn scan_complete(&self, root: &Path, files: usize) {
        self.observers.iter().for_each(|o| o.scan_complete(root, files));
    }

    fn dispatch_started(&self, jobs: usize, workers: usize) {
        self.observers.iter().for_each(|o| o.dispatch_started(jobs, workers));
    }

    fn worker_started(&self, worker_id: usize) {
        self.observers.iter().for_each(|o| o.worker_started(worker_id));
    }

    fn copy_started(&self, worker_id: usize, source: &Path, dest: &Path) {
        self.observers.iter().for_each(|o| o.copy_started(worker_id, source, dest));
    }

    fn copy_finished(&self, worker_id: usize, source: &Path, stats: &CopyStats) {
        self.observers.iter().for_each(|o| o.copy_finished(worker_id, source, stats));
    }

    fn copy_failed(&self, failure: &JobFailure, continuing: bool) {
        self.observers.iter().for_each(|o| o.copy_failed(failure, continuing));
    }

    fn worker_finished(&self, worker_id: usize, remaining: usize) {
        self.observers.iter().for_each(|o| o.worker_finished(worker_id, remaining));
    }

    fn dispatch_finished(&self, failures: usize) {
        self.observers.iter().for_each(|o| o.dispatch_finished(failures));
    }
}
