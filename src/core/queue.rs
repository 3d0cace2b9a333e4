//! Shared job queues
//!
//! Workers claim jobs one at a time from a queue shared behind an `Arc`.
//! Claim order is not part of the contract; the only guarantee is that every
//! pending job is handed out exactly once.

use crate::error::{CpjError, Result};
use crate::fs::PathList;
use crossbeam::deque::{Injector, Steal};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One file to copy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    /// Source file
    pub source: PathBuf,
    /// Destination file
    pub destination: PathBuf,
}

impl Job {
    /// Create a job
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// A thread-safe container jobs can be claimed from
pub trait ClaimQueue: Send + Sync {
    /// Remove one job, or `None` once the queue is drained
    fn claim(&self) -> Option<Job>;

    /// Number of jobs not yet claimed
    fn len(&self) -> usize;

    /// Check if every job has been claimed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parallel source/destination stacks behind one lock
#[derive(Debug, Default)]
struct JobStack {
    sources: PathList,
    destinations: PathList,
}

/// Job queue backed by two index-aligned path lists
///
/// Claims pop from the tail of both lists under a single mutex, so the
/// lists never drift apart in length.
#[derive(Debug, Default)]
pub struct JobQueue {
    stack: Mutex<JobStack>,
}

impl JobQueue {
    /// Build a queue from index-aligned source and destination lists
    pub fn new(sources: PathList, destinations: PathList) -> Result<Self> {
        if sources.len() != destinations.len() {
            return Err(CpjError::JobQueueMismatch {
                sources: sources.len(),
                destinations: destinations.len(),
            });
        }

        Ok(Self {
            stack: Mutex::new(JobStack {
                sources,
                destinations,
            }),
        })
    }

    /// Build a queue from jobs; the last job is claimed first
    pub fn from_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        let (sources, destinations) = jobs
            .into_iter()
            .map(|job| (job.source, job.destination))
            .unzip();
        Self {
            stack: Mutex::new(JobStack {
                sources,
                destinations,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobStack> {
        // A claim cannot panic between its two pops, so a poisoned
        // stack is still aligned
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append every pending job of `other` to this queue
    pub fn merge(&self, other: JobQueue) {
        let other = other.into_remaining();
        let mut stack = self.lock();
        for job in other {
            stack.sources.push(job.source);
            stack.destinations.push(job.destination);
        }
    }

    /// Consume the queue, returning unclaimed jobs in list order
    pub fn into_remaining(self) -> Vec<Job> {
        let stack = self.stack.into_inner().unwrap_or_else(PoisonError::into_inner);
        stack
            .sources
            .into_iter()
            .zip(stack.destinations)
            .map(|(source, destination)| Job {
                source,
                destination,
            })
            .collect()
    }
}

impl ClaimQueue for JobQueue {
    fn claim(&self) -> Option<Job> {
        let mut stack = self.lock();
        let source = stack.sources.pop()?;
        let destination = stack.destinations.pop()?;
        Some(Job {
            source,
            destination,
        })
    }

    fn len(&self) -> usize {
        self.lock().sources.len()
    }
}

/// Lock-free FIFO job queue over a crossbeam injector
#[derive(Debug, Default)]
pub struct InjectorJobQueue {
    jobs: Injector<Job>,
}

impl InjectorJobQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job
    pub fn push(&self, job: Job) {
        self.jobs.push(job);
    }
}

impl FromIterator<Job> for InjectorJobQueue {
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self {
        let queue = Self::new();
        for job in iter {
            queue.push(job);
        }
        queue
    }
}

impl ClaimQueue for InjectorJobQueue {
    fn claim(&self) -> Option<Job> {
        loop {
            match self.jobs.steal() {
                Steal::Success(job) => return Some(job),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn jobs(n: usize) -> Vec<Job> {
        (0..n)
            .map(|i| Job::new(format!("/src/{}", i), format!("/dst/{}", i)))
            .collect()
    }

    fn drain_concurrently<Q: ClaimQueue + 'static>(queue: Q, workers: usize) -> Vec<Job> {
        let queue = Arc::new(queue);
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(job) = queue.claim() {
                        claimed.push(job);
                    }
                    claimed
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    }

    #[test]
    fn test_claim_is_lifo() {
        let queue = JobQueue::from_jobs(jobs(3));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.claim().unwrap().source, PathBuf::from("/src/2"));
        assert_eq!(queue.claim().unwrap().source, PathBuf::from("/src/1"));
        assert_eq!(queue.claim().unwrap().destination, PathBuf::from("/dst/0"));
        assert!(queue.claim().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pairs_stay_aligned() {
        let queue = JobQueue::from_jobs(jobs(50));
        while let Some(job) = queue.claim() {
            assert_eq!(job.source.file_name(), job.destination.file_name());
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = JobQueue::new(vec![PathBuf::from("/a")], Vec::new());
        assert!(matches!(
            result,
            Err(CpjError::JobQueueMismatch {
                sources: 1,
                destinations: 0
            })
        ));
    }

    #[test]
    fn test_merge() {
        let queue = JobQueue::from_jobs(jobs(2));
        queue.merge(JobQueue::from_jobs(vec![Job::new("/src/extra", "/dst/extra")]));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.claim().unwrap().source, PathBuf::from("/src/extra"));

        let remaining = queue.into_remaining();
        assert_eq!(remaining, jobs(2));
    }

    #[test]
    fn test_injector_queue_is_fifo() {
        let queue: InjectorJobQueue = jobs(3).into_iter().collect();
        assert_eq!(queue.claim().unwrap().source, PathBuf::from("/src/0"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_empty_queue() {
        let queue = JobQueue::default();
        assert!(queue.claim().is_none());
        assert!(InjectorJobQueue::new().claim().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_each_job_claimed_once(n in 0usize..200, workers in 1usize..8) {
            let expected: HashSet<Job> = jobs(n).into_iter().collect();

            let claimed = drain_concurrently(JobQueue::from_jobs(jobs(n)), workers);
            prop_assert_eq!(claimed.len(), n);
            prop_assert_eq!(claimed.into_iter().collect::<HashSet<_>>(), expected.clone());

            let claimed = drain_concurrently(jobs(n).into_iter().collect::<InjectorJobQueue>(), workers);
            prop_assert_eq!(claimed.len(), n);
            prop_assert_eq!(claimed.into_iter().collect::<HashSet<_>>(), expected);
        }
    }
}
