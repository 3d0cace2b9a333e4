//! Worker pool dispatch and outcome aggregation
//!
//! The dispatcher starts a fixed number of workers against one shared
//! queue and consumes their outcomes until every worker has sent its
//! terminal report.

use crate::core::{ClaimQueue, DispatchStats, JobOutcome, JobQueue, Worker, WorkerPolicy};
use crate::error::{CpjError, JobFailure, Result};
use crate::fs::{CopyPrimitive, FileCopier, PathList};
use crate::progress::{CopyObserver, NoopObserver};
use crossbeam::channel::bounded;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything collected from one dispatch
#[derive(Debug, Default)]
pub struct DispatchResult {
    /// Jobs in the queue when dispatch began
    pub jobs: usize,
    /// Workers started
    pub workers: usize,
    /// Files copied successfully
    pub files_copied: u64,
    /// Bytes written
    pub bytes_copied: u64,
    /// Jobs handed to some worker
    pub jobs_claimed: u64,
    /// Jobs never claimed (workers stopped early)
    pub jobs_unclaimed: usize,
    /// Per-file failures, in the order they were received
    pub failures: Vec<JobFailure>,
    /// Workers that could not be spawned or panicked
    pub pool_errors: Vec<CpjError>,
    /// Wall-clock time of the dispatch
    pub duration: Duration,
}

impl DispatchResult {
    /// True when no file failed and the pool was healthy
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.pool_errors.is_empty()
    }

    /// All collected errors
    pub fn errors(&self) -> impl Iterator<Item = &CpjError> {
        self.failures
            .iter()
            .map(|f| &f.error)
            .chain(self.pool_errors.iter())
    }

    /// Number of collected errors
    pub fn error_count(&self) -> usize {
        self.failures.len() + self.pool_errors.len()
    }
}

/// Starts workers and aggregates their outcomes
#[derive(Clone)]
pub struct Dispatcher {
    workers: usize,
    policy: WorkerPolicy,
    copier: Arc<dyn CopyPrimitive>,
    observer: Arc<dyn CopyObserver>,
}

impl Dispatcher {
    /// Create a dispatcher for at most `workers` workers
    pub fn new(workers: usize, policy: WorkerPolicy) -> Self {
        Self {
            workers,
            policy,
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

    /// Number of workers to start for `jobs` pending jobs
    pub fn worker_count(&self, jobs: usize) -> usize {
        self.workers.max(1).min(jobs)
    }

    /// Outcome channel capacity
    ///
    /// Without continue-on-error a worker sends at most one failure and one
    /// terminal outcome. With it the failure count is unbounded, so senders
    /// block on a full channel until the aggregator catches up.
    pub fn outcome_capacity(workers: usize, continue_on_error: bool) -> usize {
        if continue_on_error {
            workers * 4
        } else {
            workers * 2
        }
    }

    /// Build a [`JobQueue`] from index-aligned lists and dispatch it
    pub fn dispatch_lists(&self, sources: PathList, destinations: PathList) -> Result<DispatchResult> {
        let queue = JobQueue::new(sources, destinations)?;
        Ok(self.dispatch(queue))
    }

    /// Drain `queue` with a pool of workers and collect their failures
    pub fn dispatch<Q: ClaimQueue + 'static>(&self, queue: Q) -> DispatchResult {
        let start = Instant::now();
        let jobs = queue.len();
        let workers = self.worker_count(jobs);

        if workers == 0 {
            self.observer.dispatch_finished(0);
            return DispatchResult {
                duration: start.elapsed(),
                ..Default::default()
            };
        }

        let queue = Arc::new(queue);
        let stats = Arc::new(DispatchStats::default());
        let (tx, rx) = bounded(Self::outcome_capacity(workers, self.policy.continue_on_error));

        self.observer.dispatch_started(jobs, workers);

        let mut handles = Vec::with_capacity(workers);
        let mut pool_errors = Vec::new();
        for id in 0..workers {
            let worker = Worker::new(
                id,
                Arc::clone(&queue),
                tx.clone(),
                Arc::clone(&self.copier),
                Arc::clone(&self.observer),
                Arc::clone(&stats),
                self.policy,
            );
            match worker.spawn() {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => {
                    tracing::error!(worker_id = id, error = %e, "worker did not start");
                    pool_errors.push(e);
                }
            }
        }
        // Only workers hold senders now, so the channel closes once all exit
        drop(tx);

        let mut failures = Vec::new();
        let mut remaining = handles.len();
        while remaining > 0 {
            match rx.recv() {
                Ok(JobOutcome::Failed(failure)) => {
                    self.observer
                        .copy_failed(&failure, self.policy.continue_on_error);
                    failures.push(failure);
                }
                Ok(outcome) => {
                    remaining -= 1;
                    self.observer.worker_finished(outcome.worker_id(), remaining);
                }
                Err(_) => {
                    tracing::warn!(remaining, "outcome channel closed before every worker reported");
                    break;
                }
            }
        }

        for (id, handle) in handles {
            if handle.join().is_err() {
                pool_errors.push(CpjError::ThreadPoolError(format!("worker {} panicked", id)));
            }
        }

        self.observer.dispatch_finished(failures.len());

        DispatchResult {
            jobs,
            workers,
            files_copied: stats.files_copied.load(Ordering::Relaxed),
            bytes_copied: stats.bytes_copied.load(Ordering::Relaxed),
            jobs_claimed: stats.jobs_claimed.load(Ordering::Relaxed),
            jobs_unclaimed: queue.len(),
            failures,
            pool_errors,
            duration: start.elapsed(),
        }
    }
}
