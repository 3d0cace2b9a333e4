//! Copy workers
//!
//! Each worker loops claim → copy → report until the queue runs dry, or
//! until its first failure when errors are not tolerated. Whatever the
//! reason it stops, a worker sends exactly one terminal outcome.

use crate::core::ClaimQueue;
use crate::error::{CpjError, JobFailure, Result};
use crate::fs::CopyPrimitive;
use crate::progress::CopyObserver;
use crossbeam::channel::Sender;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Report sent from a worker to the aggregator
#[derive(Debug)]
pub enum JobOutcome {
    /// A copy attempt failed
    Failed(JobFailure),
    /// The worker found the queue empty and exited
    Completed {
        /// Reporting worker
        worker_id: usize,
    },
    /// The worker exited after a failure because errors are not tolerated
    Stopped {
        /// Reporting worker
        worker_id: usize,
    },
}

impl JobOutcome {
    /// Worker that produced this outcome
    pub fn worker_id(&self) -> usize {
        match self {
            Self::Failed(failure) => failure.worker_id,
            Self::Completed { worker_id } | Self::Stopped { worker_id } => *worker_id,
        }
    }

    /// Whether the worker will send nothing after this
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Per-worker copy policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPolicy {
    /// Hard link files if able
    pub hardlink: bool,
    /// Keep claiming jobs after a failure
    pub continue_on_error: bool,
}

/// Counters shared by all workers of one dispatch
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Jobs claimed from the queue
    pub jobs_claimed: AtomicU64,
    /// Files copied successfully
    pub files_copied: AtomicU64,
    /// Bytes written
    pub bytes_copied: AtomicU64,
    /// Failed copy attempts
    pub failures: AtomicU64,
}

impl DispatchStats {
    fn record_claim(&self) {
        self.jobs_claimed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_copy(&self, bytes: u64) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// A unit of concurrent execution draining a shared queue
pub struct Worker<Q: ClaimQueue + ?Sized> {
    id: usize,
    queue: Arc<Q>,
    outcomes: Sender<JobOutcome>,
    copier: Arc<dyn CopyPrimitive>,
    observer: Arc<dyn CopyObserver>,
    stats: Arc<DispatchStats>,
    policy: WorkerPolicy,
}

impl<Q: ClaimQueue + ?Sized + 'static> Worker<Q> {
    /// Create a worker
    pub fn new(
        id: usize,
        queue: Arc<Q>,
        outcomes: Sender<JobOutcome>,
        copier: Arc<dyn CopyPrimitive>,
        observer: Arc<dyn CopyObserver>,
        stats: Arc<DispatchStats>,
        policy: WorkerPolicy,
    ) -> Self {
        Self {
            id,
            queue,
            outcomes,
            copier,
            observer,
            stats,
            policy,
        }
    }

    /// Run the worker on a named OS thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let id = self.id;
        thread::Builder::new()
            .name(format!("cpj-worker-{}", id))
            .spawn(move || self.run())
            .map_err(|e| CpjError::ThreadPoolError(format!("failed to spawn worker {}: {}", id, e)))
    }

    /// Run the claim → copy → report loop on the current thread
    pub fn run(self) {
        self.observer.worker_started(self.id);

        let terminal = loop {
            // The queue lock is released before any I/O starts
            let job = match self.queue.claim() {
                Some(job) => job,
                None => break JobOutcome::Completed { worker_id: self.id },
            };
            self.stats.record_claim();
            self.observer.copy_started(self.id, &job.source, &job.destination);

            match self.copier.copy(&job.source, &job.destination, self.policy.hardlink) {
                Ok(stats) => {
                    self.stats.record_copy(stats.bytes_copied);
                    self.observer.copy_finished(self.id, &job.source, &stats);
                }
                Err(error) => {
                    self.stats.record_failure();
                    let failure = JobFailure {
                        worker_id: self.id,
                        source: job.source,
                        destination: job.destination,
                        error,
                    };
                    if self.outcomes.send(JobOutcome::Failed(failure)).is_err() {
                        tracing::debug!(worker_id = self.id, "aggregator gone, worker exiting");
                        return;
                    }
                    if !self.policy.continue_on_error {
                        break JobOutcome::Stopped { worker_id: self.id };
                    }
                }
            }
        };

        tracing::debug!(worker_id = self.id, outcome = ?terminal, "worker exiting");
        if self.outcomes.send(terminal).is_err() {
            tracing::debug!(worker_id = self.id, "aggregator gone before terminal outcome");
        }
    }
}
